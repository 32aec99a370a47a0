use crate::math::Polygon;
use crate::TileId;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

#[allow(unused)]
pub fn debug_polygon(name: &str, polygon: &Polygon) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "polygon",
            "name": name,
            "points": polygon.points().iter().map(|p| [p.x, p.y]).collect::<Vec<_>>(),
        }))
    })
}

#[allow(unused)]
pub fn debug_tiles(time: i64, tiles: impl IntoIterator<Item = TileId>) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "tiles",
            "time": time,
            "tiles": tiles.into_iter().map(|t| t.0).collect::<Vec<_>>(),
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
