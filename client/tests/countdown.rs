use std::time::Duration;

use votechain_client::Countdown;

#[tokio::test(start_paused = true)]
async fn counts_down_once_per_second_and_stops_at_zero() {
    let countdown = Countdown::start(3);
    assert_eq!(countdown.remaining(), 3);

    let mut seen = Vec::new();
    for _ in 0..4 {
        tokio::time::sleep(Duration::from_millis(500)).await;
        seen.push(countdown.remaining());
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    assert_eq!(seen, vec![3, 2, 1, 0]);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(countdown.remaining(), 0);
    assert!(countdown.is_finished());
}

#[tokio::test(start_paused = true)]
async fn subscribers_observe_every_tick() {
    let countdown = Countdown::start(2);
    let mut ticks = countdown.subscribe();

    ticks.changed().await.unwrap();
    assert_eq!(*ticks.borrow_and_update(), 1);
    ticks.changed().await.unwrap();
    assert_eq!(*ticks.borrow_and_update(), 0);
    assert!(ticks.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_countdown_stops_the_ticks() {
    let countdown = Countdown::start(86400);
    let mut ticks = countdown.subscribe();

    countdown.cancel();

    assert!(ticks.changed().await.is_err());
    assert_eq!(*ticks.borrow(), 86400);
}

#[tokio::test]
async fn zero_finishes_immediately() {
    let countdown = Countdown::start(0);
    let mut ticks = countdown.subscribe();

    assert!(ticks.changed().await.is_err());
    assert_eq!(countdown.remaining(), 0);
}
