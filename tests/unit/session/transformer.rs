use std::f64::consts::FRAC_PI_2;

use super::*;
use crate::chain::link::{ChainLink, LinkSource};
use crate::foundation::core::Vec2;
use crate::graph::frame_graph::ProducerAllowList;
use crate::transform::rigid::Pose2D;

type Tf = Transformer<Pose2D>;

fn shift(x: f64) -> Pose2D {
    Pose2D::from_translation(Vec2::new(x, 0.0))
}

fn robot(opts: TransformerOpts) -> Tf {
    let mut tf = Tf::new(opts);
    for f in ["world", "odom", "imu"] {
        tf.declare_frame(f).unwrap();
    }
    tf.declare_static("world", "odom", shift(1.0)).unwrap();
    tf.declare_dynamic("odom", "imu", "imu_node").unwrap();
    tf
}

fn static_link(from: &str, to: &str, value: Pose2D) -> ChainLink<Pose2D> {
    ChainLink {
        from: from.to_owned(),
        to: to.to_owned(),
        inverted: false,
        source: LinkSource::Static(value),
    }
}

#[test]
fn default_opts() {
    let opts = TransformerOpts::default();
    assert_eq!(opts.max_search_depth, 20);
    assert!(!opts.implicit_frames);
    assert!(!opts.interpolate);
    assert_eq!(opts.samples.capacity, 64);
}

#[test]
fn declared_dynamic_edge_joins_chains_on_first_sample() {
    let mut tf = robot(TransformerOpts::default());

    assert!(tf.register_consumer("world", "imu").unwrap().is_none());
    assert!(tf.chain_for("world", "imu").is_none());
    assert!(tf.consumers().any(|k| k.from == "world" && k.to == "imu"));

    let t = Timestamp::from_millis(5);
    let outcome = tf
        .push_sample_from("imu_node", "odom", "imu", t, Pose2D::from_rotation(FRAC_PI_2))
        .unwrap();
    let report = match outcome {
        PushOutcome::NewStream(report) => report,
        other => panic!("expected a new stream, got {other:?}"),
    };
    assert_eq!(report.trigger, FramePair::new("odom", "imu"));
    assert!(matches!(
        report.update_for("world", "imu"),
        Some(ConsumerUpdate::Resolved)
    ));
    assert_eq!(report.newly_resolved().count(), 1);

    let chain = tf.chain_for("world", "imu").unwrap();
    assert_eq!(chain.len(), 2);

    let got = tf.lookup("world", "imu", t).unwrap().unwrap();
    assert_eq!(got.time, t);
    let want = Pose2D::new(Vec2::new(0.0, 1.0), FRAC_PI_2);
    assert!(got.transform.approx_eq(want, 1e-9), "{:?}", got.transform);
}

#[test]
fn later_samples_are_buffered() {
    let mut tf = robot(TransformerOpts::default());
    tf.push_sample("odom", "imu", Timestamp(10), shift(0.0)).unwrap();
    let outcome = tf.push_sample("odom", "imu", Timestamp(20), shift(2.0)).unwrap();
    assert!(matches!(outcome, PushOutcome::Buffered));

    let got = tf.lookup("odom", "imu", Timestamp(25)).unwrap().unwrap();
    assert_eq!(got.transform, shift(2.0));
}

#[test]
fn lookup_before_first_sample_is_unavailable_not_an_error() {
    let mut tf = robot(TransformerOpts::default());
    tf.push_sample("odom", "imu", Timestamp(100), shift(1.0)).unwrap();

    let unavailable = tf.lookup("world", "imu", Timestamp(50)).unwrap().unwrap_err();
    assert_eq!(
        unavailable,
        Unavailable {
            from: "odom".to_owned(),
            to: "imu".to_owned(),
            time_us: 50,
        }
    );
}

#[test]
fn interpolation_follows_opts() {
    let opts = TransformerOpts {
        interpolate: true,
        ..TransformerOpts::default()
    };
    let mut tf = robot(opts);
    tf.push_sample("odom", "imu", Timestamp(0), shift(0.0)).unwrap();
    tf.push_sample("odom", "imu", Timestamp(10), shift(4.0)).unwrap();

    let got = tf.lookup("odom", "imu", Timestamp(5)).unwrap().unwrap();
    assert!(got.transform.approx_eq(shift(2.0), 1e-9));
}

#[test]
fn reverse_direction_sample_is_stored_inverted() {
    let mut tf = robot(TransformerOpts::default());
    let value = Pose2D::new(Vec2::new(1.0, 2.0), 0.3);
    tf.push_sample("imu", "odom", Timestamp(0), value).unwrap();

    let forward = tf.lookup("odom", "imu", Timestamp(0)).unwrap().unwrap();
    assert!(forward.transform.approx_eq(value.inverse(), 1e-9));

    let backward = tf.lookup("imu", "odom", Timestamp(0)).unwrap().unwrap();
    assert!(backward.transform.approx_eq(value, 1e-9));
}

#[test]
fn samples_for_static_edges_are_rejected() {
    let mut tf = robot(TransformerOpts::default());
    let err = tf
        .push_sample("odom", "world", Timestamp(0), shift(1.0))
        .unwrap_err();
    assert!(matches!(err, TfError::StaticSample { .. }), "{err}");
}

#[test]
fn undeclared_pair_becomes_anonymous_dynamic_edge() {
    let mut tf = robot(TransformerOpts::default());
    tf.declare_frame("gps").unwrap();
    tf.push_sample("world", "gps", Timestamp(0), shift(3.0)).unwrap();

    let edge = tf
        .graph()
        .edges_touching("gps")
        .unwrap()
        .next()
        .unwrap()
        .edge();
    match edge.kind() {
        EdgeKind::Dynamic { producer, stream } => {
            assert_eq!(producer, ANONYMOUS_PRODUCER);
            assert!(stream.is_some());
        }
        other => panic!("unexpected edge {other:?}"),
    }
}

#[test]
fn unknown_frames_fail_unless_implicit() {
    let mut tf = robot(TransformerOpts::default());
    let err = tf
        .push_sample("odom", "lidar", Timestamp(0), shift(1.0))
        .unwrap_err();
    assert!(matches!(err, TfError::UnknownFrame(ref f) if f == "lidar"));

    let mut tf = robot(TransformerOpts {
        implicit_frames: true,
        ..TransformerOpts::default()
    });
    tf.push_sample("odom", "lidar", Timestamp(0), shift(1.0)).unwrap();
    assert!(tf.graph().has_frame("lidar"));
    assert!(tf.resolve("world", "lidar").is_ok());
}

#[test]
fn invalid_names_are_rejected_even_when_implicit() {
    let mut tf = robot(TransformerOpts {
        implicit_frames: true,
        ..TransformerOpts::default()
    });
    let err = tf
        .push_sample("odom", "bad name", Timestamp(0), shift(1.0))
        .unwrap_err();
    assert!(matches!(err, TfError::InvalidFrameName(_)));
}

#[test]
fn producer_validator_guards_new_edges() {
    let mut tf = Tf::new(TransformerOpts::default())
        .with_validator(ProducerAllowList::new(["imu_node"]));
    for f in ["odom", "imu", "gps"] {
        tf.declare_frame(f).unwrap();
    }
    tf.declare_dynamic("odom", "imu", "imu_node").unwrap();

    let err = tf.declare_dynamic("odom", "gps", "rogue").unwrap_err();
    assert!(matches!(err, TfError::InvalidProducer(ref p) if p == "rogue"));

    let err = tf
        .push_sample("odom", "gps", Timestamp(0), shift(1.0))
        .unwrap_err();
    assert!(matches!(err, TfError::InvalidProducer(ref p) if p == ANONYMOUS_PRODUCER));
    assert_eq!(tf.graph().edge_count(), 1);
}

#[test]
fn first_seen_twice_is_a_duplicate() {
    let mut tf = robot(TransformerOpts::default());
    tf.on_dynamic_sample_first_seen("odom", "imu", "imu_node")
        .unwrap();
    let err = tf
        .on_dynamic_sample_first_seen("imu", "odom", "imu_node")
        .unwrap_err();
    assert!(matches!(err, TfError::DuplicateTransform { .. }));
}

#[test]
fn shorter_path_replaces_cached_chain() {
    let mut tf = Tf::new(TransformerOpts::default());
    for f in ["a", "b", "c"] {
        tf.declare_frame(f).unwrap();
    }
    tf.declare_static("a", "b", shift(1.0)).unwrap();
    tf.declare_static("b", "c", shift(1.0)).unwrap();
    let before = tf.resolve("a", "c").unwrap();
    assert_eq!(before.len(), 2);

    let report = tf.declare_static("a", "c", shift(2.0)).unwrap();
    assert!(matches!(
        report.update_for("a", "c"),
        Some(ConsumerUpdate::Updated)
    ));
    assert_eq!(tf.chain_for("a", "c").unwrap().len(), 1);
    // Snapshot handed out earlier is untouched.
    assert_eq!(before.len(), 2);
}

#[test]
fn failed_re_resolution_keeps_previous_chain() {
    let mut tf = Tf::new(TransformerOpts {
        max_search_depth: 1,
        ..TransformerOpts::default()
    });
    for f in ["a", "b", "c", "d"] {
        tf.declare_frame(f).unwrap();
    }
    tf.declare_static("a", "b", shift(1.0)).unwrap();
    tf.declare_static("b", "c", shift(1.0)).unwrap();

    let manual = TransformChain::from_links(
        "a",
        "c",
        vec![
            static_link("a", "b", shift(1.0)),
            static_link("b", "c", shift(1.0)),
        ],
    )
    .unwrap();
    tf.set_chain(manual.clone()).unwrap();

    let report = tf.declare_static("c", "d", shift(1.0)).unwrap();
    assert!(matches!(
        report.update_for("a", "c"),
        Some(ConsumerUpdate::Retained(TfError::MaxDepthExceeded { depth: 1, .. }))
    ));
    assert_eq!(*tf.chain_for("a", "c").unwrap(), manual);
}

#[test]
fn unresolved_consumers_stay_registered() {
    let mut tf = Tf::new(TransformerOpts::default());
    for f in ["a", "b", "c"] {
        tf.declare_frame(f).unwrap();
    }
    let err = tf.lookup("a", "c", Timestamp(0)).unwrap_err();
    assert!(matches!(err, TfError::ChainNotFound { .. }));

    let report = tf.declare_static("a", "b", shift(1.0)).unwrap();
    assert!(matches!(
        report.update_for("a", "c"),
        Some(ConsumerUpdate::Unresolved(TfError::ChainNotFound { .. }))
    ));

    let report = tf.declare_static("b", "c", shift(1.0)).unwrap();
    assert!(matches!(
        report.update_for("a", "c"),
        Some(ConsumerUpdate::Resolved)
    ));
    let got = tf.lookup("a", "c", Timestamp(0)).unwrap().unwrap();
    assert!(got.transform.approx_eq(shift(2.0), 1e-9));
}

#[test]
fn structural_errors_do_not_register_consumers() {
    let mut tf = robot(TransformerOpts::default());
    assert!(matches!(
        tf.register_consumer("world", "nowhere"),
        Err(TfError::UnknownFrame(_))
    ));
    assert_eq!(tf.consumers().count(), 0);
}

#[test]
fn set_chain_checks_frames() {
    let mut tf = robot(TransformerOpts::default());
    let chain = TransformChain::from_links(
        "world",
        "map",
        vec![static_link("world", "map", shift(1.0))],
    )
    .unwrap();
    assert!(matches!(
        tf.set_chain(chain),
        Err(TfError::UnknownFrame(ref f)) if f == "map"
    ));
}

#[test]
fn clear_drops_everything() {
    let mut tf = robot(TransformerOpts::default());
    tf.push_sample("odom", "imu", Timestamp(0), shift(1.0)).unwrap();
    tf.resolve("world", "imu").unwrap();

    tf.clear();
    assert_eq!(tf.graph().frame_count(), 0);
    assert_eq!(tf.graph().edge_count(), 0);
    assert_eq!(tf.consumers().count(), 0);
    assert_eq!(tf.opts().max_search_depth, 20);
}

#[test]
fn latest_store_serves_newest_sample_for_any_time() {
    use crate::samples::latest::LatestSampleStore;

    let mut tf: Transformer<Pose2D, LatestSampleStore<Pose2D>> =
        Transformer::with_store(TransformerOpts::default(), LatestSampleStore::new());
    tf.declare_frame("odom").unwrap();
    tf.declare_frame("imu").unwrap();
    tf.push_sample("odom", "imu", Timestamp(100), shift(1.0)).unwrap();

    let got = tf.lookup("odom", "imu", Timestamp(0)).unwrap().unwrap();
    assert_eq!(got.transform, shift(1.0));
}

#[test]
fn opts_from_json_fill_defaults() {
    let opts = TransformerOpts::from_json(r#"{ "interpolate": true, "samples": { "max_age_us": 500000 } }"#)
        .unwrap();
    assert!(opts.interpolate);
    assert_eq!(opts.max_search_depth, 20);
    assert_eq!(opts.samples.capacity, 64);
    assert_eq!(opts.samples.max_age_us, Some(500_000));

    let err = TransformerOpts::from_json(r#"{ "max_search_depth": "deep" }"#).unwrap_err();
    assert!(matches!(err, TfError::Other(_)));
}

#[test]
fn chain_held_across_clear_stays_unavailable() {
    let mut tf = robot(TransformerOpts::default());
    tf.push_sample("odom", "imu", Timestamp(0), shift(1.0)).unwrap();
    let held = tf.resolve("odom", "imu").unwrap();

    tf.clear();
    tf.declare_frame("map").unwrap();
    tf.declare_frame("gps").unwrap();
    tf.push_sample("map", "gps", Timestamp(0), shift(99.0)).unwrap();

    let err = tf.evaluate(&held, Timestamp(0), false).unwrap_err();
    assert_eq!(err.from, "odom");
    assert_eq!(err.to, "imu");
}

#[test]
fn first_sample_of_undeclared_pair_heals_consumer() {
    let mut tf = Tf::new(TransformerOpts::default());
    for f in ["a", "b", "c"] {
        tf.declare_frame(f).unwrap();
    }
    tf.declare_static("a", "b", shift(1.0)).unwrap();
    assert!(tf.register_consumer("a", "c").unwrap().is_none());

    let outcome = tf.push_sample("b", "c", Timestamp(0), shift(2.0)).unwrap();
    let report = match outcome {
        PushOutcome::NewStream(report) => report,
        other => panic!("expected a new stream, got {other:?}"),
    };
    assert!(matches!(
        report.update_for("a", "c"),
        Some(ConsumerUpdate::Resolved)
    ));

    let chain = tf.chain_for("a", "c").unwrap();
    assert_eq!(chain.len(), 2);
    let got = tf.lookup("a", "c", Timestamp(0)).unwrap().unwrap();
    assert!(got.transform.approx_eq(shift(3.0), 1e-9));
}

#[test]
fn rejected_producer_leaves_no_implicit_frames() {
    let mut tf = Tf::new(TransformerOpts {
        implicit_frames: true,
        ..TransformerOpts::default()
    })
    .with_validator(ProducerAllowList::new(["imu_node"]));
    tf.declare_frame("odom").unwrap();

    let err = tf
        .push_sample("odom", "lidar", Timestamp(0), shift(1.0))
        .unwrap_err();
    assert!(matches!(err, TfError::InvalidProducer(_)));
    assert!(!tf.graph().has_frame("lidar"));
    assert_eq!(tf.graph().frame_count(), 1);

    let err = tf
        .push_sample_from("imu_node", "gps", "gps", Timestamp(0), shift(1.0))
        .unwrap_err();
    assert!(matches!(err, TfError::SelfTransform(_)));
    assert!(!tf.graph().has_frame("gps"));

    tf.push_sample_from("imu_node", "odom", "lidar", Timestamp(0), shift(1.0))
        .unwrap();
    assert!(tf.graph().has_frame("lidar"));
}
