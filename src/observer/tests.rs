use super::*;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl ChunkObserver for Recorder {
    fn on_chunk_open(&self, path: &Path) -> Result<(), HookError> {
        self.events.lock().unwrap().push(format!("open {}", path.display()));
        Ok(())
    }

    fn on_chunk_close(&self, path: &Path) -> Result<(), HookError> {
        self.events.lock().unwrap().push(format!("close {}", path.display()));
        Ok(())
    }
}

struct Failing;

impl ChunkObserver for Failing {
    fn on_chunk_open(&self, _path: &Path) -> Result<(), HookError> {
        Err("observer refused".into())
    }

    fn on_chunk_close(&self, _path: &Path) -> Result<(), HookError> {
        panic!("observer exploded");
    }
}

#[test]
fn test_default_methods_are_noops() {
    struct Silent;
    impl ChunkObserver for Silent {}

    let silent = Silent;
    assert!(silent.on_chunk_open(Path::new("a")).is_ok());
    assert!(silent.on_chunk_close(Path::new("a")).is_ok());
    assert!(silent.on_progress(3).is_ok());
}

#[test]
fn test_callbacks_route_events() {
    let opened = Arc::new(Mutex::new(Vec::<PathBuf>::new()));
    let sink = Arc::clone(&opened);

    let callbacks = Callbacks::new().with_open(move |path| {
        sink.lock().unwrap().push(path.to_path_buf());
        Ok(())
    });

    callbacks.on_chunk_open(Path::new("x_0001.txt")).unwrap();
    callbacks.on_chunk_close(Path::new("x_0001.txt")).unwrap();
    callbacks.on_progress(10).unwrap();

    assert_eq!(*opened.lock().unwrap(), vec![PathBuf::from("x_0001.txt")]);
}

#[test]
fn test_failures_do_not_stop_fan_out() {
    let recorder = Arc::new(Recorder::default());

    let mut observers = Observers::default();
    observers.push(Arc::new(Failing));
    observers.push(recorder.clone());

    observers.chunk_opened(Path::new("a"));
    observers.chunk_closed(Path::new("a"));
    observers.progress(1);

    assert_eq!(*recorder.events.lock().unwrap(), vec!["open a", "close a"]);
}

#[test]
fn test_progress_logger_never_fails() {
    let logger = ProgressLogger::new("input.txt", 0);
    for words in 0..5 {
        assert!(logger.on_progress(words).is_ok());
    }
    assert!(logger.on_chunk_close(Path::new("c")).is_ok());
}
