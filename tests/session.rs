mod common;

use std::time::Duration;

use common::{is_recording_file_name, options, FakeBackend};
use tray_recorder::{CaptureArea, Framerate, RecordingSession, SessionError, Settings, Termination};

fn settings(area: CaptureArea, framerate: Framerate, with_sound: bool) -> Settings {
    Settings {
        area,
        framerate,
        with_sound,
    }
}

#[tokio::test]
async fn start_then_stop_reports_the_start_settings() {
    let dir = tempfile::tempdir().unwrap();

    for area in [CaptureArea::FullScreen, CaptureArea::ActiveWindow] {
        for framerate in Framerate::ALL {
            for with_sound in [false, true] {
                let backend = FakeBackend::new().with_window(10, 20, 640, 480);
                let mut session = RecordingSession::new(backend, options(dir.path()));
                let requested = settings(area, framerate, with_sound);

                let started = session.start(&requested).await.unwrap();
                assert!(session.is_recording());

                let stopped = session.stop().await.unwrap();
                assert!(!session.is_recording());
                assert_eq!(stopped.info, started);
                assert_eq!(stopped.info.area, area);
                assert_eq!(stopped.info.framerate, framerate);
                assert_eq!(stopped.info.with_sound, with_sound);
            }
        }
    }
}

#[tokio::test]
async fn full_screen_without_sound() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new(), options(dir.path()));

    let info = session
        .start(&settings(CaptureArea::FullScreen, Framerate::Fps30, false))
        .await
        .unwrap();

    assert_eq!(info.output_path.parent(), Some(dir.path()));
    let name = info.output_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(is_recording_file_name(&name), "unexpected file name {}", name);
    assert_eq!(info.dimensions, "2560x1440");

    let cmd = session.backend().last_command();
    assert!(cmd.has_pair("-framerate", "30"));
    assert!(cmd.has_pair("-i", ":0.0"));
    assert!(!cmd.args.iter().any(|a| a == "pulse"));
    assert!(!cmd.args.iter().any(|a| a == "-video_size"));
    assert_eq!(cmd.args.last().unwrap(), info.output_path.as_os_str());

    session.stop().await.unwrap();
}

#[tokio::test]
async fn active_window_geometry_shapes_the_capture() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new().with_window(100, 50, 800, 600);
    let mut session = RecordingSession::new(backend, options(dir.path()));

    let info = session
        .start(&settings(CaptureArea::ActiveWindow, Framerate::Fps60, true))
        .await
        .unwrap();
    assert_eq!(info.dimensions, "800x600");

    let cmd = session.backend().last_command();
    assert!(cmd.has_pair("-video_size", "800x600"));
    assert!(cmd.has_pair("-i", ":0.0+100,50"));
    assert!(cmd.has_pair("-framerate", "60"));
    assert!(cmd.has_pair("-f", "pulse"));
    assert!(cmd.has_pair("-ac", "2"));
    assert!(cmd.has_pair("-i", "default"));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn no_active_window_leaves_session_idle() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new(), options(dir.path()));

    let err = session
        .start(&settings(CaptureArea::ActiveWindow, Framerate::Fps30, true))
        .await
        .unwrap_err();

    assert!(matches!(err, SessionError::NoActiveWindow));
    assert!(!session.is_recording());
    assert_eq!(session.backend().spawn_count(), 0);
}

#[tokio::test]
async fn start_while_recording_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new(), options(dir.path()));
    let requested = Settings::default();

    let first = session.start(&requested).await.unwrap();
    let err = session.start(&requested).await.unwrap_err();

    assert!(matches!(err, SessionError::AlreadyRecording));
    assert_eq!(session.backend().spawn_count(), 1);
    assert_eq!(session.current(), Some(&first));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn stop_while_idle_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new(), options(dir.path()));

    let err = session.stop().await.unwrap_err();
    assert!(matches!(err, SessionError::NotRecording));
    assert!(!session.is_recording());
}

#[tokio::test]
async fn stubborn_process_is_killed_after_the_grace_period() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new().ignoring_term();
    let mut session = RecordingSession::new(backend, options(dir.path()));

    session.start(&Settings::default()).await.unwrap();
    // let the shell install its trap before signalling
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stopped = session.stop().await.unwrap();
    assert_eq!(
        stopped.termination,
        Termination::Forced {
            grace: Duration::from_millis(500)
        }
    );
    assert!(!session.is_recording());
}

#[tokio::test]
async fn spawn_failure_leaves_session_idle() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new().failing_spawn(), options(dir.path()));

    let err = session.start(&Settings::default()).await.unwrap_err();
    assert!(matches!(err, SessionError::SpawnFailed(_)));
    assert!(!session.is_recording());
}

#[tokio::test]
async fn failed_display_authorization_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new(), options(dir.path()));

    session.start(&Settings::default()).await.unwrap();
    assert_eq!(session.backend().authorizations.get(), 1);
    assert!(session.is_recording());

    session.stop().await.unwrap();
}

#[tokio::test]
async fn output_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("Videos").join("screen");
    let mut session = RecordingSession::new(FakeBackend::new(), options(&nested));

    let info = session.start(&Settings::default()).await.unwrap();
    assert!(nested.is_dir());
    assert!(info.output_path.starts_with(&nested));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn capture_exit_is_noticed() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new().exiting(), options(dir.path()));

    let info = session.start(&Settings::default()).await.unwrap();

    let mut ended = None;
    for _ in 0..100 {
        ended = session.poll_exit();
        if ended.is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let (ended_info, status) = ended.expect("exit not noticed");
    assert_eq!(ended_info, info);
    assert_eq!(status.code(), Some(1));
    assert!(!session.is_recording());
    assert!(session.poll_exit().is_none());
}

#[tokio::test]
async fn restart_within_a_second_keeps_the_finished_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = RecordingSession::new(FakeBackend::new(), options(dir.path()));

    let first = session.start(&Settings::default()).await.unwrap();
    // what ffmpeg would have written
    std::fs::write(&first.output_path, b"first recording").unwrap();
    session.stop().await.unwrap();

    let second = session.start(&Settings::default()).await.unwrap();
    assert_ne!(second.output_path, first.output_path);
    let name = second.output_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(is_recording_file_name(&name), "unexpected file name {}", name);

    let cmd = session.backend().last_command();
    assert_eq!(cmd.args.last().unwrap(), second.output_path.as_os_str());
    assert!(!cmd.args.iter().any(|a| a == "-y"));

    session.stop().await.unwrap();
    assert_eq!(std::fs::read(&first.output_path).unwrap(), b"first recording");
}
