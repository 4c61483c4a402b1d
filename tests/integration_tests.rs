//! Integration tests for aux-mount.
//!
//! These tests drive a [`Mount`] against a scripted in-memory motor
//! controller and check the bus traffic it produces.

mod common;
mod unit;

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;

use aux_mount::alignment::AlignmentModel;
use aux_mount::config::units::STEPS_PER_DEGREE;
use aux_mount::config::{ApproachConfig, ApproachMode, MountConfig, ObserverSite, SlewLimits, TransformConfig};
use aux_mount::error::{ConfigError, Error, MotionError, TransportError};
use aux_mount::motion::{Direction, GuideRate, SlewSpeed};
use aux_mount::transform::{
    AstronomicalOracle, Body, CoordinateTransformPipeline, FixedClock, HorizontalCoord, JulianDate, SiderealOracle,
};
use aux_mount::{
    Axis, AuxCommand, CommandCode, CoordSetMode, CoordSetOutcome, Degrees, DeviceId, EncoderPosition,
    EquatorialCoord, GotoState, Hours, Mount, OperationState, PointDisposition, Steps, StepsPerSec, Target,
};

use common::MockTransport;

const NOW: JulianDate = JulianDate(2_460_200.4);

type TestMount = Mount<MockTransport, SiderealOracle, FixedClock>;

fn site() -> ObserverSite {
    ObserverSite::new(Degrees(50.0), Degrees(20.0), 0.0)
}

fn config() -> MountConfig {
    MountConfig {
        site: site(),
        ..MountConfig::default()
    }
}

fn mount_with(transport: &MockTransport, config: MountConfig) -> TestMount {
    Mount::builder(transport.clone())
        .clock(FixedClock(NOW))
        .config(config)
        .build()
        .unwrap()
}

fn encoder(deg: f64) -> u32 {
    Steps::from_degrees(Degrees(deg)).to_encoder()
}

/// A target on the celestial equator one hour east of the meridian.
fn rising_target() -> EquatorialCoord {
    let lst = Hours::from_degrees(NOW.local_sidereal_time(site().longitude));
    EquatorialCoord::new(Hours(lst.value() + 1.0), Degrees(0.0))
}

/// A target on the celestial equator one hour west of the meridian.
fn setting_target() -> EquatorialCoord {
    let lst = Hours::from_degrees(NOW.local_sidereal_time(site().longitude));
    EquatorialCoord::new(Hours(lst.value() - 1.0), Degrees(0.0))
}

/// Fixed-star conversions, plus a Moon whose RA and Dec run ahead of the
/// stars along a cubic in time.
#[derive(Debug, Clone, Copy)]
struct DriftingOracle;

fn drifting_position(at: JulianDate) -> EquatorialCoord {
    let t = (at.0 - NOW.0) * 86_400.0 / 30.0;
    let base = rising_target();
    EquatorialCoord::new(
        Hours(base.ra.value() + 0.01 * t.powi(3)),
        Degrees(base.dec.value() + 0.05 * t.powi(3)),
    )
}

impl AstronomicalOracle for DriftingOracle {
    fn apparent_altaz(&self, position: EquatorialCoord, site: &ObserverSite, at: JulianDate) -> HorizontalCoord {
        SiderealOracle.apparent_altaz(position, site, at)
    }

    fn equatorial_of(&self, position: HorizontalCoord, site: &ObserverSite, at: JulianDate) -> EquatorialCoord {
        SiderealOracle.equatorial_of(position, site, at)
    }

    fn body_position(&self, body: &Body, _site: &ObserverSite, at: JulianDate) -> Option<EquatorialCoord> {
        match body {
            Body::Moon => Some(drifting_position(at)),
            _ => None,
        }
    }
}

/// Centred-difference axis rates (steps/s) of `position_at` over +-30 s,
/// computed straight from the fixed-star oracle.
fn expected_rates(position_at: impl Fn(JulianDate) -> EquatorialCoord) -> (f64, f64) {
    let steps = |at: JulianDate| {
        let sky = SiderealOracle.apparent_altaz(position_at(at), &site(), at);
        (sky.az.value() * STEPS_PER_DEGREE, sky.alt.value() * STEPS_PER_DEGREE)
    };
    let ahead = steps(NOW.offset_seconds(30.0));
    let behind = steps(NOW.offset_seconds(-30.0));
    ((ahead.0 - behind.0) / 60.0, (ahead.1 - behind.1) / 60.0)
}

fn guide_commands(transport: &MockTransport) -> Vec<AuxCommand> {
    transport
        .log()
        .into_iter()
        .filter(|c| {
            c.command == CommandCode::MC_SET_POS_GUIDERATE || c.command == CommandCode::MC_SET_NEG_GUIDERATE
        })
        .collect()
}

fn fixed_approach(offset: u32) -> ApproachConfig {
    ApproachConfig {
        mode: ApproachMode::Fixed,
        azm_offset: offset,
        alt_offset: offset,
    }
}

// =============================================================================
// GoTo
// =============================================================================

#[tokio::test]
async fn test_fixed_approach_command_order() {
    let transport = MockTransport::new();
    let mount = mount_with(
        &transport,
        MountConfig {
            approach: fixed_approach(5000),
            ..config()
        },
    );

    let outcome = mount.goto_steps(EncoderPosition::new(20_000, 10_000)).await.unwrap();

    assert_eq!(outcome.state, GotoState::Done);
    assert_eq!(
        outcome.plan.approach,
        Some(EncoderPosition::new(15_000, 5_000))
    );
    assert_eq!(
        transport.gotos(),
        vec![
            (DeviceId::AZM, 15_000, CommandCode::MC_GOTO_FAST),
            (DeviceId::ALT, 5_000, CommandCode::MC_GOTO_FAST),
            (DeviceId::AZM, 20_000, CommandCode::MC_GOTO_SLOW),
            (DeviceId::ALT, 10_000, CommandCode::MC_GOTO_SLOW),
        ]
    );

    // Both axes are polled to completion before the final leg starts.
    let log = transport.log();
    let first_slow = log
        .iter()
        .position(|c| c.command == CommandCode::MC_GOTO_SLOW)
        .unwrap();
    let polls_before = log[..first_slow]
        .iter()
        .filter(|c| c.command == CommandCode::MC_SLEW_DONE)
        .count();
    assert!(polls_before >= 2);

    assert_eq!(mount.goto_state(), GotoState::Done);
    assert_eq!(mount.operation_state(), OperationState::Ok);
    assert_eq!(mount.axes().position(), EncoderPosition::new(20_000, 10_000));
}

#[tokio::test]
async fn test_disabled_approach_is_one_fast_leg() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());

    let outcome = mount.goto_steps(EncoderPosition::new(1234, 5678)).await.unwrap();

    assert_eq!(outcome.plan.approach, None);
    assert_eq!(
        transport.gotos(),
        vec![
            (DeviceId::AZM, 1234, CommandCode::MC_GOTO_FAST),
            (DeviceId::ALT, 5678, CommandCode::MC_GOTO_FAST),
        ]
    );
}

#[tokio::test]
async fn test_limit_violation_sends_nothing() {
    let transport = MockTransport::new();
    let mount = mount_with(
        &transport,
        MountConfig {
            limits: SlewLimits::new(Degrees(0.0), Degrees(90.0), Degrees(0.0), Degrees(360.0)),
            ..config()
        },
    );

    let result = mount.goto_steps(EncoderPosition::new(encoder(120.0), encoder(-10.0))).await;

    assert!(matches!(
        result,
        Err(Error::Motion(MotionError::LimitViolation { .. }))
    ));
    assert!(transport.log().is_empty());
    assert_eq!(mount.goto_state(), GotoState::Rejected);
}

#[tokio::test]
async fn test_slew_axis_keeps_other_axis() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());
    mount.goto_steps(EncoderPosition::new(1000, 2000)).await.unwrap();
    transport.clear_log();

    mount.slew_axis(Axis::Altitude, 4000, SlewSpeed::Slow).await.unwrap();

    assert_eq!(
        transport.gotos(),
        vec![(DeviceId::ALT, 4000, CommandCode::MC_GOTO_SLOW)]
    );
    assert_eq!(mount.axes().position(), EncoderPosition::new(1000, 4000));
}

#[tokio::test]
async fn test_equatorial_goto_runs_two_passes() {
    let transport = MockTransport::new();
    let mount = mount_with(
        &transport,
        MountConfig {
            approach: fixed_approach(5000),
            ..config()
        },
    );

    let outcome = mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Slew)
        .await
        .unwrap();

    assert!(matches!(outcome, CoordSetOutcome::Slewed(_)));
    let gotos = transport.gotos();
    // Coarse pass without approach, then approach leg and final leg.
    assert_eq!(gotos.len(), 6);
    assert_eq!(gotos[0].2, CommandCode::MC_GOTO_FAST);
    assert_eq!(gotos[1].2, CommandCode::MC_GOTO_FAST);
    assert_eq!(gotos[4].2, CommandCode::MC_GOTO_SLOW);
    assert_eq!(gotos[5].2, CommandCode::MC_GOTO_SLOW);
    assert_eq!(gotos[0].1, gotos[4].1);
    assert_eq!(gotos[1].1, gotos[5].1);
    assert!(!mount.is_tracking().await);

    let sky = SiderealOracle.apparent_altaz(rising_target(), &site(), NOW);
    assert!(gotos[4].1.abs_diff(encoder(sky.az.value())) <= 1);
    assert!(gotos[5].1.abs_diff(encoder(sky.alt.value())) <= 1);
}

#[tokio::test]
async fn test_unresolved_body_falls_back_to_last_position() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());

    mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Slew)
        .await
        .unwrap();
    let first = transport.gotos();
    transport.clear_log();

    mount
        .goto_equatorial(Target::Body(Body::Moon), CoordSetMode::Slew)
        .await
        .unwrap();

    assert_eq!(transport.gotos(), first);
    assert_eq!(mount.target(), Some(Target::Body(Body::Moon)));
}

// =============================================================================
// Tracking
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_tracking_sends_sidereal_guide_rates() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());

    let outcome = mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Track)
        .await
        .unwrap();
    assert!(matches!(outcome, CoordSetOutcome::Tracking(_)));
    assert!(mount.is_tracking().await);

    tokio::time::sleep(Duration::from_millis(2500)).await;
    mount.set_tracking(false).await.unwrap();
    assert!(!mount.is_tracking().await);

    let log = transport.log();
    let guides: Vec<_> = log
        .iter()
        .filter(|c| {
            c.command == CommandCode::MC_SET_POS_GUIDERATE || c.command == CommandCode::MC_SET_NEG_GUIDERATE
        })
        .collect();
    assert!(guides.len() >= 4, "expected repeated updates, got {}", guides.len());

    let last_azm = guides.iter().rev().find(|c| c.destination == DeviceId::AZM).unwrap();
    let last_alt = guides.iter().rev().find(|c| c.destination == DeviceId::ALT).unwrap();
    // Rising in the east.
    assert_eq!(last_alt.command, CommandCode::MC_SET_POS_GUIDERATE);

    let alt = SiderealOracle.apparent_altaz(rising_target(), &site(), NOW).alt;
    let azm_rate = f64::from(last_azm.steps().unwrap()) / 1024.0 * alt.to_radians().cos();
    let alt_rate = f64::from(last_alt.steps().unwrap()) / 1024.0;
    assert_relative_eq!(azm_rate.hypot(alt_rate), 15.041, epsilon = 0.05);

    // Tracking off ends with a zero rate on both axes.
    let stops: Vec<_> = log
        .iter()
        .rev()
        .take(2)
        .map(|c| (c.command, c.destination, c.payload.to_vec()))
        .collect();
    assert_eq!(
        stops,
        vec![
            (CommandCode::MC_MOVE_POS, DeviceId::ALT, vec![0]),
            (CommandCode::MC_MOVE_POS, DeviceId::AZM, vec![0]),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_set_tracking_uses_last_target() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());
    mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Slew)
        .await
        .unwrap();
    assert!(!mount.is_tracking().await);

    mount.set_tracking(true).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(mount.is_tracking().await);
    assert!(mount.axes().azm.tracking || mount.axes().alt.tracking);

    mount.abort().await.unwrap();
    assert!(!mount.is_tracking().await);
}

// =============================================================================
// Abort, park, home
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_abort_interrupts_slew() {
    let transport = MockTransport::new();
    transport.state.lock().busy_polls = u32::MAX;
    let mount = Arc::new(mount_with(&transport, config()));

    let task = {
        let mount = Arc::clone(&mount);
        tokio::spawn(async move { mount.goto_steps(EncoderPosition::new(1000, 2000)).await })
    };
    tokio::time::sleep(Duration::from_millis(1100)).await;
    mount.abort().await.unwrap();

    let result = task.await.unwrap();
    assert_eq!(result, Err(Error::Motion(MotionError::Aborted)));

    let stops = transport.commands(CommandCode::MC_MOVE_POS);
    assert_eq!(stops.len(), 2);
    assert!(stops.iter().all(|c| c.payload.as_slice() == [0]));
    assert!(!mount.axes().is_slewing());
}

#[tokio::test]
async fn test_park_ignores_approach() {
    let transport = MockTransport::at(100_000, 200_000);
    let mount = mount_with(
        &transport,
        MountConfig {
            approach: fixed_approach(5000),
            ..config()
        },
    );

    mount.park().await.unwrap();

    assert_eq!(
        transport.gotos(),
        vec![
            (DeviceId::AZM, 0, CommandCode::MC_GOTO_FAST),
            (DeviceId::ALT, 0, CommandCode::MC_GOTO_FAST),
        ]
    );
    assert!(mount.is_parked());
    mount.unpark();
    assert!(!mount.is_parked());
}

#[tokio::test]
async fn test_home_selected_axis() {
    let transport = MockTransport::at(100_000, 200_000);
    let mount = mount_with(&transport, config());

    mount.home(false, true).await.unwrap();

    assert_eq!(
        transport.gotos(),
        vec![(DeviceId::ALT, 0, CommandCode::MC_GOTO_FAST)]
    );
    assert_eq!(mount.operation_state(), OperationState::Ok);
}

// =============================================================================
// Sync and alignment
// =============================================================================

#[tokio::test]
async fn test_sync_adds_point_and_redefines_position() {
    let transport = MockTransport::at(3_000_000, 1_500_000);
    let mount = mount_with(&transport, config());
    let target = Target::Sidereal(rising_target());

    let disposition = mount.sync(&target).await.unwrap();
    assert_eq!(disposition, PointDisposition::Appended);
    assert_eq!(mount.alignment_status().point_count, 1);

    let reads = transport.commands(CommandCode::MC_GET_POSITION);
    assert_eq!(reads.len(), 2);
    let sets = transport.commands(CommandCode::MC_SET_POSITION);
    assert_eq!(sets.len(), 2);
    assert_eq!((sets[0].destination, sets[0].steps().unwrap()), (DeviceId::AZM, 3_000_000));
    assert_eq!((sets[1].destination, sets[1].steps().unwrap()), (DeviceId::ALT, 1_500_000));

    // A GoTo to the synced target returns to the synced encoders.
    transport.clear_log();
    mount.goto_equatorial(target, CoordSetMode::Slew).await.unwrap();
    let gotos = transport.gotos();
    let (azm, alt) = (gotos[gotos.len() - 2].1, gotos[gotos.len() - 1].1);
    assert!(azm.abs_diff(3_000_000) <= 1, "azm {azm}");
    assert!(alt.abs_diff(1_500_000) <= 1, "alt {alt}");
}

#[tokio::test]
async fn test_sync_mode_through_goto_equatorial() {
    let transport = MockTransport::at(3_000_000, 1_500_000);
    let mount = mount_with(&transport, config());

    let outcome = mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Sync)
        .await
        .unwrap();

    assert_eq!(outcome, CoordSetOutcome::Synced(PointDisposition::Appended));
    assert!(transport.gotos().is_empty());

    assert!(mount.undo_last_alignment().is_some());
    assert_eq!(mount.alignment_status().point_count, 0);
}

#[tokio::test]
async fn test_current_equatorial_without_alignment() {
    let position = SiderealOracle.apparent_altaz(rising_target(), &site(), NOW);
    let transport = MockTransport::at(encoder(position.az.value()), encoder(position.alt.value()));
    let mount = mount_with(&transport, config());

    let coord = mount.current_equatorial().await.unwrap();

    assert_relative_eq!(coord.dec.value(), 0.0, epsilon = 1e-3);
    let expected = rising_target().ra.value().rem_euclid(24.0);
    assert_relative_eq!(coord.ra.value().rem_euclid(24.0), expected, epsilon = 1e-4);
}

// =============================================================================
// Manual motion, status, cord wrap
// =============================================================================

#[tokio::test]
async fn test_rate_slew() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());

    let err = mount.slew_by_rate(Axis::Altitude, 12, Direction::Positive).await;
    assert_eq!(err, Err(Error::Motion(MotionError::InvalidSlewRate(12))));
    assert!(transport.log().is_empty());

    mount.slew_by_rate(Axis::Azimuth, 9, Direction::Negative).await.unwrap();
    let log = transport.log();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].command, CommandCode::MC_MOVE_NEG);
    assert_eq!(log[0].destination, DeviceId::AZM);
    assert_eq!(log[0].payload.as_slice(), [9]);
    assert!(mount.axes().azm.slewing);

    mount.slew_by_rate(Axis::Azimuth, 0, Direction::Negative).await.unwrap();
    assert!(!mount.axes().azm.slewing);
}

#[tokio::test]
async fn test_guide_rate_sets_axis_rates() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());

    mount
        .set_guide_rate(GuideRate::from_raw(15_400), GuideRate::STOP)
        .await
        .unwrap();

    let log = transport.log();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].command, CommandCode::MC_SET_POS_GUIDERATE);
    assert_eq!(log[0].steps().unwrap(), 15_400);
    assert_eq!(log[1].destination, DeviceId::ALT);
    assert_eq!(log[1].steps().unwrap(), 0);
    assert!(mount.axes().azm.tracking);
    assert!(!mount.axes().alt.tracking);
}

#[tokio::test]
async fn test_poll_status_stops_outside_limits() {
    let transport = MockTransport::at(encoder(90.0), encoder(-10.0));
    let mount = mount_with(
        &transport,
        MountConfig {
            limits: SlewLimits::new(Degrees(0.0), Degrees(90.0), Degrees(0.0), Degrees(360.0)),
            ..config()
        },
    );

    let status = mount.poll_status().await.unwrap();

    assert!(status.limit_stop);
    assert!(!status.slewing);
    assert_eq!(status.position, EncoderPosition::new(encoder(90.0), encoder(-10.0)));
    let stops = transport.commands(CommandCode::MC_MOVE_POS);
    assert_eq!(stops.len(), 2);
}

#[tokio::test]
async fn test_poll_status_inside_limits() {
    let transport = MockTransport::at(encoder(90.0), encoder(45.0));
    transport.state.lock().busy_polls = 1;
    let mount = mount_with(&transport, config());

    let status = mount.poll_status().await.unwrap();

    assert!(!status.limit_stop);
    assert!(status.slewing);
    assert!(!status.parked);
    assert!(transport.commands(CommandCode::MC_MOVE_POS).is_empty());
}

#[tokio::test]
async fn test_cord_wrap_commands() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());

    mount.enable_cord_wrap().await.unwrap();
    mount.set_cord_wrap_position(123_456).await.unwrap();
    assert_eq!(mount.cord_wrap_position().await.unwrap(), 123_456);
    mount.disable_cord_wrap().await.unwrap();

    let commands: Vec<_> = transport.log().iter().map(|c| (c.command, c.destination)).collect();
    assert_eq!(
        commands,
        vec![
            (CommandCode::MC_ENABLE_CORDWRAP, DeviceId::AZM),
            (CommandCode::MC_SET_CORDWRAP_POS, DeviceId::AZM),
            (CommandCode::MC_GET_CORDWRAP_POS, DeviceId::AZM),
            (CommandCode::MC_DISABLE_CORDWRAP, DeviceId::AZM),
        ]
    );
}

// =============================================================================
// Failures and configuration
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_silent_mount_times_out() {
    let transport = MockTransport::new();
    transport.state.lock().silent = true;
    let mount = mount_with(&transport, config());

    let result = mount.goto_steps(EncoderPosition::new(1000, 2000)).await;

    assert_eq!(result, Err(Error::Transport(TransportError::Timeout)));
    assert_eq!(mount.goto_state(), GotoState::Alert);
    assert_eq!(mount.operation_state(), OperationState::Alert);
}

#[tokio::test]
async fn test_invalid_limits_rejected_at_runtime() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());

    let result = mount.set_limits(SlewLimits::new(Degrees(50.0), Degrees(10.0), Degrees(0.0), Degrees(360.0)));

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidAltitudeLimits { .. }))
    ));
    assert_eq!(mount.config().limits, SlewLimits::default());
}

#[test]
fn test_builder_rejects_invalid_config() {
    let mut config = config();
    config.site.latitude = Degrees(120.0);

    let result = Mount::builder(MockTransport::new()).config(config).build();

    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidLatitude(_)))
    ));
}

// =============================================================================
// Tracking interplay with other motion
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_raw_goto_cancels_tracking() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());
    mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Track)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!guide_commands(&transport).is_empty());

    transport.clear_log();
    transport.state.lock().busy_polls = 20;
    mount.goto_steps(EncoderPosition::new(3_000_000, 1_000_000)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert!(!mount.is_tracking().await);
    assert!(guide_commands(&transport).is_empty());
    assert_eq!(mount.axes().position(), EncoderPosition::new(3_000_000, 1_000_000));
}

#[tokio::test(start_paused = true)]
async fn test_slew_axis_and_home_cancel_tracking() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());
    mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Track)
        .await
        .unwrap();

    mount.slew_axis(Axis::Azimuth, 2_000_000, SlewSpeed::Fast).await.unwrap();
    assert!(!mount.is_tracking().await);

    mount.set_tracking(true).await.unwrap();
    assert!(mount.is_tracking().await);
    mount.home(true, true).await.unwrap();
    assert!(!mount.is_tracking().await);

    transport.clear_log();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(guide_commands(&transport).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tracking_sends_altitude_when_azimuth_fails() {
    let transport = MockTransport::new();
    transport.reject(CommandCode::MC_SET_POS_GUIDERATE, DeviceId::AZM);
    transport.reject(CommandCode::MC_SET_NEG_GUIDERATE, DeviceId::AZM);
    let mount = mount_with(&transport, config());

    mount
        .goto_equatorial(Target::Sidereal(rising_target()), CoordSetMode::Track)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(2500)).await;
    mount.set_tracking(false).await.unwrap();

    let guides = guide_commands(&transport);
    let azm = guides.iter().filter(|c| c.destination == DeviceId::AZM).count();
    let alt = guides.iter().filter(|c| c.destination == DeviceId::ALT).count();
    assert!(azm >= 3, "azimuth attempts {azm}");
    assert_eq!(alt, azm);
}

// =============================================================================
// Moving bodies and tracking approach
// =============================================================================

#[test]
fn test_moving_body_rates_resolve_each_side() {
    let site = site();
    let transform = TransformConfig::default();
    let model = AlignmentModel::default();
    let pipeline = CoordinateTransformPipeline::new(&DriftingOracle, &site, &transform);
    let fallback = EquatorialCoord::default();

    let moving = pipeline.tracking_rates(&model, &Target::Body(Body::Moon), fallback, NOW, 30.0);
    let (azm, alt) = expected_rates(drifting_position);
    assert_relative_eq!(moving.azm.value(), azm, epsilon = 1e-3);
    assert_relative_eq!(moving.alt.value(), alt, epsilon = 1e-3);

    // Freezing the body where it is now gives plain sidereal rates instead.
    let frozen = Target::Sidereal(drifting_position(NOW));
    let fixed = pipeline.tracking_rates(&model, &frozen, fallback, NOW, 30.0);
    let (azm, alt) = expected_rates(|_| drifting_position(NOW));
    assert_relative_eq!(fixed.azm.value(), azm, epsilon = 1e-3);
    assert_relative_eq!(fixed.alt.value(), alt, epsilon = 1e-3);

    let sky_alt = SiderealOracle.apparent_altaz(drifting_position(NOW), &site, NOW).alt;
    let cos_alt = sky_alt.to_radians().cos();
    let difference = ((moving.azm.value() - fixed.azm.value()) * cos_alt).hypot(moving.alt.value() - fixed.alt.value());
    assert!(difference > 100.0, "moving and fixed rates differ by only {difference} steps/s");
}

#[tokio::test(start_paused = true)]
async fn test_tracking_moving_body_sends_its_own_rates() {
    let transport = MockTransport::new();
    let mount = Mount::builder(transport.clone())
        .oracle(DriftingOracle)
        .clock(FixedClock(NOW))
        .config(config())
        .build()
        .unwrap();

    mount
        .goto_equatorial(Target::Body(Body::Moon), CoordSetMode::Track)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    mount.set_tracking(false).await.unwrap();

    let guides = guide_commands(&transport);
    let (azm, alt) = expected_rates(drifting_position);
    for (device, rate) in [(DeviceId::AZM, azm), (DeviceId::ALT, alt)] {
        let sent = guides.iter().rev().find(|c| c.destination == device).unwrap();
        let expected = GuideRate::from_steps_per_sec(StepsPerSec(rate));
        assert_eq!(sent.command, expected.command());
        assert!(
            sent.steps().unwrap().abs_diff(expected.value()) <= 1,
            "{device:?}: sent {} expected {}",
            sent.steps().unwrap(),
            expected.value()
        );
    }
}

#[tokio::test]
async fn test_tracking_approach_follows_target_motion() {
    let transport = MockTransport::new();
    let mount = mount_with(
        &transport,
        MountConfig {
            approach: ApproachConfig {
                mode: ApproachMode::Tracking,
                azm_offset: 5000,
                alt_offset: 5000,
            },
            ..config()
        },
    );

    let outcome = mount
        .goto_equatorial(Target::Sidereal(setting_target()), CoordSetMode::Slew)
        .await
        .unwrap();

    let (azm_rate, alt_rate) = expected_rates(|_| setting_target());
    assert!(alt_rate < 0.0, "target should be setting");

    let gotos = transport.gotos();
    assert_eq!(gotos.len(), 6);
    let (approach_azm, approach_alt) = (gotos[2].1, gotos[3].1);
    let (final_azm, final_alt) = (gotos[4].1, gotos[5].1);
    assert_eq!(gotos[2].2, CommandCode::MC_GOTO_FAST);
    assert_eq!(gotos[3].2, CommandCode::MC_GOTO_FAST);
    assert_eq!(gotos[4].2, CommandCode::MC_GOTO_SLOW);
    assert_eq!(gotos[5].2, CommandCode::MC_GOTO_SLOW);

    // Altitude comes down onto a setting target from above.
    assert_eq!(approach_alt, final_alt + 5000);
    if azm_rate >= 0.0 {
        assert_eq!(approach_azm, final_azm - 5000);
    } else {
        assert_eq!(approach_azm, final_azm + 5000);
    }

    match outcome {
        CoordSetOutcome::Slewed(outcome) => {
            assert_eq!(outcome.plan.approach, Some(EncoderPosition::new(approach_azm, approach_alt)));
            assert_eq!(outcome.plan.target, EncoderPosition::new(final_azm, final_alt));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

// =============================================================================
// Rejections and abort bookkeeping
// =============================================================================

#[tokio::test]
async fn test_slew_axis_limit_rejection_is_alert() {
    let transport = MockTransport::new();
    let mount = mount_with(
        &transport,
        MountConfig {
            limits: SlewLimits::new(Degrees(0.0), Degrees(90.0), Degrees(0.0), Degrees(360.0)),
            ..config()
        },
    );

    let result = mount.slew_axis(Axis::Altitude, encoder(-10.0), SlewSpeed::Fast).await;

    assert!(matches!(
        result,
        Err(Error::Motion(MotionError::LimitViolation { .. }))
    ));
    assert!(transport.log().is_empty());
    assert_eq!(mount.operation_state(), OperationState::Alert);
}

#[tokio::test]
async fn test_abort_keeps_state_of_unacknowledged_axes() {
    let transport = MockTransport::new();
    let mount = mount_with(&transport, config());
    mount.slew_by_rate(Axis::Azimuth, 5, Direction::Positive).await.unwrap();
    assert!(mount.axes().azm.slewing);

    transport.clear_log();
    transport.reject(CommandCode::MC_MOVE_POS, DeviceId::AZM);
    let result = mount.abort().await;

    assert_eq!(result, Err(Error::Transport(TransportError::Closed)));
    // Altitude acknowledged its stop; azimuth never did.
    assert!(mount.axes().azm.slewing);
    assert!(!mount.axes().alt.slewing);
    assert_eq!(transport.commands(CommandCode::MC_MOVE_POS).len(), 2);
}
