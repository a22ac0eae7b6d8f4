mod common;

use common::{Recorder, builder, ms, three_slides};
use easy_slideshow::surface::HeadlessSurface;
use easy_slideshow::{EventKind, listener};
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn registering_twice_fires_once_per_event() {
    let surface = HeadlessSurface::div("show");
    let show = builder(&surface, three_slides()).spawn().unwrap();
    let rec = Recorder::default();
    let l = rec.listener();
    show.add_listener(EventKind::SlideChangeEnd, &l);
    show.add_listener(EventKind::SlideChangeEnd, &l);

    sleep(ms(1500)).await;
    assert_eq!(rec.indices(EventKind::SlideChangeEnd), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn removed_listener_stops_receiving() {
    let surface = HeadlessSurface::div("show");
    let show = builder(&surface, three_slides()).spawn().unwrap();
    let rec = Recorder::default();
    let l = rec.listener();
    show.add_listener(EventKind::SlideChangeEnd, &l);

    sleep(ms(300)).await;
    show.remove_listener(EventKind::SlideChangeEnd, &l);
    sleep(ms(1200)).await;
    assert_eq!(show.current_index(), 1);
    assert_eq!(rec.indices(EventKind::SlideChangeEnd), vec![0]);
}

#[tokio::test(start_paused = true)]
async fn end_listener_can_fire_immediately() {
    let surface = HeadlessSurface::div("show");
    let show = builder(&surface, three_slides()).spawn().unwrap();

    sleep(ms(300)).await;
    let rec = Recorder::default();
    show.add_slide_change_end_listener(&rec.listener(), true);
    assert!(rec.indices(EventKind::SlideChangeEnd).is_empty());

    sleep(ms(10)).await;
    assert_eq!(rec.indices(EventKind::SlideChangeEnd), vec![0]);

    sleep(ms(1200)).await;
    assert_eq!(rec.indices(EventKind::SlideChangeEnd), vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn progress_is_reported_for_the_incoming_slide() {
    let surface = HeadlessSurface::div("show");
    let show = builder(&surface, three_slides()).spawn().unwrap();
    let rec = Recorder::default();
    let l = rec.listener();
    show.add_listener(EventKind::TransitionProgress, &l);

    sleep(ms(300)).await;
    let first = rec.progress();
    assert!(first.len() >= 2);
    assert!(first.iter().all(|(index, p)| *index == 0 && (0.0..=1.0).contains(p)));
    assert_eq!(first.last().map(|(_, p)| *p), Some(1.0));

    sleep(ms(1200)).await;
    let all = rec.progress();
    assert!(all[first.len()..].iter().all(|(index, _)| *index == 1));
    assert_eq!(all.last().map(|(_, p)| *p), Some(1.0));

    show.remove_listener(EventKind::TransitionProgress, &l);
    let seen = rec.len();
    sleep(ms(1200)).await;
    assert_eq!(rec.len(), seen);
}

#[tokio::test(start_paused = true)]
async fn panicking_listener_does_not_stop_playback() {
    let surface = HeadlessSurface::div("show");
    let show = builder(&surface, three_slides()).spawn().unwrap();
    let rec = Recorder::default();
    show.add_listener(
        EventKind::SlideChangeEnd,
        &listener(|_| panic!("listener failure")),
    );
    show.add_listener(EventKind::SlideChangeEnd, &rec.listener());

    sleep(ms(2700)).await;
    assert_eq!(show.current_index(), 2);
    assert_eq!(rec.indices(EventKind::SlideChangeEnd), vec![0, 1, 2]);
}

#[tokio::test(start_paused = true)]
async fn listeners_run_after_the_state_they_report() {
    let surface = HeadlessSurface::div("show");
    let show = builder(&surface, three_slides()).spawn().unwrap();
    let observed = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    let l = {
        let observed = observed.clone();
        let probe = show.clone();
        listener(move |ev| observed.lock().push((ev.index, probe.current_index())))
    };
    show.add_listener(EventKind::SlideChangeEnd, &l);

    sleep(ms(1500)).await;
    assert_eq!(*observed.lock(), vec![(0, 0), (1, 1)]);
}
