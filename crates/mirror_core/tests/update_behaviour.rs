use std::sync::Once;

use mirror_core::{
    update, AppState, Effect, Msg, Phase, ProgressUpdate, RunResultKind, RunState, RunSummary,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(mirror_logging::initialize_for_tests);
}

fn started() -> AppState {
    let (state, effects) = update(AppState::new(), Msg::StartClicked);
    assert_eq!(effects, vec![Effect::StartRun]);
    state
}

#[test]
fn start_moves_idle_to_running() {
    init_logging();
    let state = started();
    let view = state.view();

    assert_eq!(view.run, RunState::Running);
    assert_eq!(view.percent, 0);
    assert!(view.dirty);
}

#[test]
fn start_is_ignored_while_running() {
    init_logging();
    let (state, effects) = update(started(), Msg::StartClicked);

    assert_eq!(state.run(), RunState::Running);
    assert!(effects.is_empty());
}

#[test]
fn pause_and_resume_emit_effects() {
    init_logging();
    let (state, effects) = update(started(), Msg::PauseClicked);
    assert_eq!(state.run(), RunState::Paused);
    assert_eq!(effects, vec![Effect::PauseRun]);

    let (state, effects) = update(state, Msg::PauseClicked);
    assert_eq!(state.run(), RunState::Paused);
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::ResumeClicked);
    assert_eq!(state.run(), RunState::Running);
    assert_eq!(effects, vec![Effect::ResumeRun]);
}

#[test]
fn cancel_from_paused_goes_to_cancelling_then_cancelled() {
    init_logging();
    let (state, _) = update(started(), Msg::PauseClicked);
    let (state, effects) = update(state, Msg::CancelClicked);
    assert_eq!(state.run(), RunState::Cancelling);
    assert_eq!(effects, vec![Effect::CancelRun]);

    let (state, effects) = update(state, Msg::Finished(RunResultKind::Cancelled));
    assert_eq!(state.run(), RunState::Cancelled);
    assert!(effects.is_empty());

    let (state, effects) = update(state, Msg::CancelClicked);
    assert_eq!(state.run(), RunState::Cancelled);
    assert!(effects.is_empty());
}

#[test]
fn phase_change_jumps_to_band_start_and_percent_may_reset() {
    init_logging();
    let (state, _) = update(started(), Msg::PhaseChanged(Phase::Crawling));
    assert_eq!(state.view().percent, 10);

    let (state, _) = update(
        state,
        Msg::Progress(ProgressUpdate::percent(28, "crawled 9 pages")),
    );
    assert_eq!(state.view().percent, 28);

    let (state, _) = update(state, Msg::Progress(ProgressUpdate::percent(12, "restart")));
    assert_eq!(state.view().percent, 12);
    assert_eq!(state.view().message, "restart");
}

#[test]
fn status_updates_keep_percent_and_track_url() {
    init_logging();
    let (state, _) = update(started(), Msg::PhaseChanged(Phase::Processing));
    let (mut state, _) = update(
        state,
        Msg::Progress(ProgressUpdate::status(
            "fetching",
            Some("https://example.com/a".to_string()),
        )),
    );
    let view = state.view();

    assert_eq!(view.percent, 30);
    assert_eq!(view.current_url.as_deref(), Some("https://example.com/a"));
    assert_eq!(
        view.status_line(),
        "[ 30%] fetching (https://example.com/a)"
    );
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn completion_records_summary() {
    init_logging();
    let summary = RunSummary {
        pages_written: 2,
        resources_downloaded: 5,
        resources_failed: 1,
        errors: 1,
    };
    let (state, _) = update(started(), Msg::Finished(RunResultKind::Completed(summary)));
    let view = state.view();

    assert_eq!(view.run, RunState::Completed);
    assert_eq!(view.percent, 100);
    assert_eq!(view.summary, Some(summary));
    assert_eq!(view.current_url, None);
}

#[test]
fn failure_keeps_message_and_allows_restart() {
    init_logging();
    let (state, _) = update(
        started(),
        Msg::Finished(RunResultKind::Failed("disk full".to_string())),
    );
    assert_eq!(state.run(), RunState::Failed);
    assert_eq!(state.view().failure.as_deref(), Some("disk full"));

    let (state, effects) = update(state, Msg::StartClicked);
    assert_eq!(state.run(), RunState::Running);
    assert_eq!(state.view().failure, None);
    assert_eq!(effects, vec![Effect::StartRun]);
}
