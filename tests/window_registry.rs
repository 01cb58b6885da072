//! Window registry behaviour against a scripted console

mod support;

use publish_pilot::browser::MAIN_WINDOW;
use publish_pilot::core::PilotError;
use support::{open_page, test_config, ConsoleState};
use tokio_test::{assert_err, assert_ok};

#[tokio::test]
async fn test_main_window_registered_on_open() {
    let (config, _dir) = test_config();
    let (page, _state, _clock) = open_page(ConsoleState::default(), &config).await;

    assert_eq!(page.windows().len(), 1);
    assert_eq!(page.windows().active(), Some(MAIN_WINDOW));
    assert_eq!(page.windows().handle(MAIN_WINDOW).map(|h| h.as_str()), Some("w0"));
}

#[tokio::test]
async fn test_register_binds_the_window_that_appeared() {
    let (config, _dir) = test_config();
    let (mut page, state, _clock) = open_page(ConsoleState::default(), &config).await;

    assert_ok!(page.click("#PublishButton_0").await);
    let handle = assert_ok!(page.register_and_activate("publish").await);

    assert_eq!(handle.as_str(), "w1");
    assert_eq!(page.windows().active(), Some("publish"));
    assert_eq!(state.lock().unwrap().current.as_ref(), Some(&handle));
}

#[tokio::test]
async fn test_duplicate_registration_is_fatal() {
    let (config, _dir) = test_config();
    let (mut page, state, _clock) = open_page(ConsoleState::default(), &config).await;

    assert_ok!(page.click("#PublishButton_0").await);
    assert_ok!(page.register_new_window("publish").await);
    state.lock().unwrap().open_window();

    let err = assert_err!(page.register_new_window("publish").await);
    assert!(matches!(err, PilotError::DuplicateWindow(ref name) if name == "publish"));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_window_did_not_appear() {
    let (config, _dir) = test_config();
    let (mut page, _state, clock) = open_page(ConsoleState::default(), &config).await;

    let err = assert_err!(page.register_new_window("password").await);
    assert!(matches!(err, PilotError::WindowDidNotAppear(ref name) if name == "password"));
    assert!(!err.is_fatal());
    assert!(page.windows().handle("password").is_none());
    // Five attempts, four pauses between them
    assert_eq!(clock.sleeps(), 4);
}

#[tokio::test]
async fn test_close_unbinds_and_focuses_fallback() {
    let (config, _dir) = test_config();
    let (mut page, state, _clock) = open_page(ConsoleState::default(), &config).await;

    assert_ok!(page.click("#PublishButton_0").await);
    assert_ok!(page.register_and_activate("publish").await);
    assert_ok!(page.close_window("publish", None).await);

    assert!(page.windows().handle("publish").is_none());
    assert_eq!(page.windows().active(), Some(MAIN_WINDOW));

    let state = state.lock().unwrap();
    assert_eq!(state.handles.len(), 1);
    assert_eq!(state.current.as_ref().map(|h| h.as_str()), Some("w0"));
}

#[tokio::test]
async fn test_close_tolerates_window_already_gone() {
    let (config, _dir) = test_config();
    let (mut page, state, _clock) = open_page(ConsoleState::default(), &config).await;

    assert_ok!(page.click("#RestoreButton").await);
    let handle = assert_ok!(page.register_new_window("password").await);
    state.lock().unwrap().handles.retain(|h| *h != handle);

    assert_ok!(page.close_window("password", None).await);
    assert!(page.windows().handle("password").is_none());
}

#[tokio::test]
async fn test_name_reusable_after_close() {
    let (config, _dir) = test_config();
    let (mut page, _state, _clock) = open_page(ConsoleState::default(), &config).await;

    assert_ok!(page.click("#RestoreButton").await);
    assert_ok!(page.register_new_window("password").await);
    assert_ok!(page.close_window("password", None).await);

    assert_ok!(page.click("#PublishButton").await);
    let handle = assert_ok!(page.register_new_window("password").await);
    assert_eq!(handle.as_str(), "w2");
}

#[tokio::test]
async fn test_activate_unknown_name() {
    let (config, _dir) = test_config();
    let (mut page, _state, _clock) = open_page(ConsoleState::default(), &config).await;

    let err = assert_err!(page.activate("publish").await);
    assert!(matches!(err, PilotError::UnknownWindow(_)));
}

#[tokio::test]
async fn test_unexpected_window_count() {
    let (config, _dir) = test_config();
    let (mut page, state, _clock) = open_page(ConsoleState::default(), &config).await;

    assert_ok!(page.click("#PublishButton_0").await);
    assert_ok!(page.register_and_activate("publish").await);
    assert_eq!(assert_ok!(page.unexpected_window_count().await), 0);

    // Two registered names, three live handles
    state.lock().unwrap().open_window();
    assert_eq!(assert_ok!(page.unexpected_window_count().await), 1);

    assert_ok!(page.register_and_activate("expected_popup").await);
    assert_ok!(page.close_window("expected_popup", Some("publish")).await);
    assert_eq!(assert_ok!(page.unexpected_window_count().await), 0);
    assert_eq!(page.windows().active(), Some("publish"));
}
