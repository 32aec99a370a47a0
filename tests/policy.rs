//! Tests of the first-come-first-served request policy.

use slotmap::SlotMap;
use std::sync::Arc;
use tile_reservation::{
    math::{LineSegment2d, Point2d, Polygon, Rect},
    Config, Connection, FcfsPolicy, Interval, LaneAttributes, LaneId, Proposal, RejectReason,
    Request, ReservationGridManager, Response, Traversal, VehicleId,
    VehicleSpec,
};

fn setup() -> (ReservationGridManager, LaneId, Vec<VehicleId>) {
    let mut conn = Connection::new(Polygon::from_rect(Rect::new(
        Interval::new(0.0, 30.0),
        Interval::new(0.0, 4.0),
    )));
    let lane = conn.add_lane(&LaneAttributes {
        curve: &LineSegment2d::from_ends(Point2d::new(-20.0, 2.0), Point2d::new(50.0, 2.0)),
        width: 4.0,
        speed_limit: 20.0,
    });
    let config = Config {
        time_step: 0.1,
        grid_time_step: 0.1,
        granularity: 10.0,
        ..Default::default()
    };
    let manager = ReservationGridManager::new(config, Arc::new(conn)).unwrap();
    let mut ids = SlotMap::<VehicleId, ()>::with_key();
    let vehicles = (0..3).map(|_| ids.insert(())).collect();
    (manager, lane, vehicles)
}

fn proposal(lane: LaneId, arrival_time: f64) -> Proposal {
    Proposal {
        arrival_time,
        arrival_velocity: 5.0,
        arrival_lane: lane,
        departure_lane: lane,
        max_turn_velocity: 10.0,
    }
}

fn request(vehicle: VehicleId, proposals: Vec<Proposal>) -> Request {
    Request {
        vehicle,
        spec: VehicleSpec {
            length: 4.0,
            width: 2.0,
            max_acceleration: 2.0,
            ..Default::default()
        },
        proposals,
    }
}

fn confirmed(response: Response) -> tile_reservation::Confirmation {
    match response {
        Response::Confirm(confirmation) => confirmation,
        Response::Reject(reason) => panic!("rejected: {reason:?}"),
    }
}

#[test]
fn first_request_is_confirmed() {
    let (mut manager, lane, ids) = setup();
    let policy = FcfsPolicy::default();

    let confirmation =
        confirmed(policy.process(&mut manager, &request(ids[0], vec![proposal(lane, 0.0)])).unwrap());
    assert_eq!(confirmation.reservation, ids[0]);
    assert_eq!(confirmation.proposal, 0);
    assert_eq!(confirmation.arrival_time, 0.0);
    assert!(confirmation.exit_time > 0.0);
    assert!((confirmation.exit_velocity - 10.0).abs() < 1e-6);
    assert_eq!(confirmation.profile.phases().len(), 2);
    assert!(manager.has_reservation(ids[0]));
}

#[test]
fn second_request_from_same_vehicle_is_rejected() {
    let (mut manager, lane, ids) = setup();
    let policy = FcfsPolicy::default();
    policy.process(&mut manager, &request(ids[0], vec![proposal(lane, 0.0)])).unwrap();

    let response = policy.process(&mut manager, &request(ids[0], vec![proposal(lane, 5.0)])).unwrap();
    assert_eq!(response, Response::Reject(RejectReason::ConfirmedAnotherRequest));
}

#[test]
fn later_proposal_is_used_when_earlier_conflicts() {
    let (mut manager, lane, ids) = setup();
    let policy = FcfsPolicy {
        traversal: Traversal::Coast,
        ..Default::default()
    };
    policy.process(&mut manager, &request(ids[0], vec![proposal(lane, 0.0)])).unwrap();

    let response = policy.process(&mut manager, &request(ids[1], vec![proposal(lane, 0.0)])).unwrap();
    assert_eq!(response, Response::Reject(RejectReason::NoClearPath));
    assert!(!manager.has_reservation(ids[1]));

    let proposals = vec![proposal(lane, 0.5), proposal(lane, 8.0)];
    let confirmation = confirmed(policy.process(&mut manager, &request(ids[1], proposals)).unwrap());
    assert_eq!(confirmation.proposal, 1);
    assert_eq!(confirmation.arrival_time, 8.0);
    assert_eq!(confirmation.exit_velocity, 5.0);
}

#[test]
fn proposals_outside_the_window_are_rejected() {
    let (mut manager, lane, ids) = setup();
    let policy = FcfsPolicy::default();
    manager.act(5.0);

    let late = request(ids[0], vec![proposal(lane, 1.0), proposal(lane, 4.9)]);
    assert_eq!(
        policy.process(&mut manager, &late).unwrap(),
        Response::Reject(RejectReason::ArrivalTimeTooLate)
    );

    let far = request(ids[0], vec![proposal(lane, 15.1), proposal(lane, 100.0)]);
    assert_eq!(
        policy.process(&mut manager, &far).unwrap(),
        Response::Reject(RejectReason::ArrivalTimeTooLarge)
    );

    let mixed = request(ids[0], vec![proposal(lane, 1.0), proposal(lane, 30.0)]);
    assert_eq!(
        policy.process(&mut manager, &mixed).unwrap(),
        Response::Reject(RejectReason::ArrivalTimeTooLarge)
    );

    let in_window = request(ids[0], vec![proposal(lane, 1.0), proposal(lane, 14.0)]);
    assert_eq!(confirmed(policy.process(&mut manager, &in_window).unwrap()).proposal, 1);
    assert!(manager.current_time() >= 5.0);
}
