use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use imgkit_image::{Image, PixelId};
use imgkit_process::{
    Command, EventKind, NativeEvent, NativeProcess, ProcessError, ProcessObject, ShiftScaleFilter,
};

fn counter() -> (Arc<AtomicUsize>, Command) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let command = Command::new(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (count, command)
}

#[test]
fn remove_all_commands_deduplicates() -> Result<(), ProcessError> {
    let _ = env_logger::builder().is_test(true).try_init();

    let po = ProcessObject::new("po");
    let (_, command) = counter();
    po.add_command(EventKind::Start, &command)?;
    po.add_command(EventKind::End, &command)?;
    assert_eq!(command.process_object_count(), 1);

    let native = Arc::new(NativeProcess::new("native"));
    po.pre_update(&native)?;
    assert_eq!(native.observer_count(), 3);

    po.remove_all_commands();
    assert_eq!(command.process_object_count(), 0);
    assert!(!po.has_command(EventKind::Start));
    assert!(!po.has_command(EventKind::End));
    // only the delete hook is left
    assert_eq!(native.observer_count(), 1);
    Ok(())
}

#[test]
fn out_of_band_delete_returns_to_idle() -> Result<(), ProcessError> {
    let po = ProcessObject::new("po");
    let (calls, command) = counter();
    po.add_command(EventKind::Progress, &command)?;

    let native = Arc::new(NativeProcess::new("native"));
    po.pre_update(&native)?;
    native.update_progress(0.4);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(po.progress(), 0.4);

    drop(native);
    assert!(!po.is_active());
    assert_eq!(po.progress(), 0.4);
    assert!(matches!(
        po.active_process(),
        Err(ProcessError::NoActiveOperation(name)) if name == "po"
    ));

    let (_, late) = counter();
    assert_eq!(po.add_command(EventKind::End, &late)?, None);
    assert!(po.has_command(EventKind::End));

    let next = Arc::new(NativeProcess::new("next"));
    assert_eq!(next.observer_count(), 0);
    po.pre_update(&next)?;
    assert!(next.has_observer(NativeEvent::End));
    assert!(next.has_observer(NativeEvent::Progress));
    Ok(())
}

#[test]
fn dropping_a_command_detaches_it() -> Result<(), ProcessError> {
    let po = ProcessObject::new("po");
    let other = ProcessObject::new("other");
    let (_, command) = counter();
    let (_, kept) = counter();
    po.add_command(EventKind::Iteration, &command)?;
    po.add_command(EventKind::Iteration, &kept)?;
    other.add_command(EventKind::User, &command)?;
    assert_eq!(command.process_object_count(), 2);

    let native = Arc::new(NativeProcess::new("native"));
    po.pre_update(&native)?;
    assert_eq!(native.observer_count(), 3);

    drop(command);
    assert!(po.has_command(EventKind::Iteration));
    assert!(!other.has_command(EventKind::User));
    assert_eq!(native.observer_count(), 2);
    assert_eq!(kept.process_object_count(), 1);
    Ok(())
}

#[test]
fn dropping_the_process_object_first() -> Result<(), ProcessError> {
    let (calls, command) = counter();
    let native = Arc::new(NativeProcess::new("native"));
    {
        let po = ProcessObject::new("po");
        po.add_command(EventKind::Any, &command)?;
        po.pre_update(&native)?;
    }
    native.invoke_event(NativeEvent::User);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(command.process_object_count(), 0);
    drop(native);
    Ok(())
}

#[test]
fn filter_reports_every_event() -> Result<(), ProcessError> {
    let image = Image::new(&[16, 8, 4], PixelId::Int16)?;
    let filter = ShiftScaleFilter::new().with_shift(3.0);
    filter.set_number_of_threads(2);

    let mut counters = Vec::new();
    let mut commands = Vec::new();
    for event in [
        EventKind::Start,
        EventKind::Progress,
        EventKind::Iteration,
        EventKind::End,
        EventKind::Abort,
        EventKind::Delete,
    ] {
        let (count, command) = counter();
        filter.add_command(event, &command)?;
        counters.push(count);
        commands.push(command);
    }

    let output = filter.execute(&image)?;
    assert_eq!(output.get_pixel_as_i16(&[15, 7, 3])?, 3);

    let seen: Vec<usize> = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    // 4 blocks along z, one progress per block plus the final one
    assert_eq!(seen, vec![1, 5, 4, 1, 0, 1]);
    assert!(!filter.is_active());

    filter.execute(&image)?;
    assert_eq!(counters[0].load(Ordering::SeqCst), 2);
    Ok(())
}

#[test]
fn command_can_abort_the_filter() -> Result<(), ProcessError> {
    let image = Image::new(&[4, 4, 10], PixelId::Float64)?;
    let filter = Arc::new(ShiftScaleFilter::new());

    let weak = Arc::downgrade(&filter);
    let abort = Command::named("abort", move || {
        if let Some(filter) = weak.upgrade() {
            if filter.progress() >= 0.3 {
                filter.abort();
            }
        }
    });
    let (aborts, on_abort) = counter();
    filter.add_command(EventKind::Progress, &abort)?;
    filter.add_command(EventKind::Abort, &on_abort)?;

    let res = filter.execute(&image);
    assert_eq!(
        res.err(),
        Some(ProcessError::Aborted("ShiftScaleImageFilter".to_string()))
    );
    assert_eq!(aborts.load(Ordering::SeqCst), 1);
    assert!(!filter.is_active());
    assert!(filter.progress() >= 0.3 && filter.progress() < 1.0);
    Ok(())
}

#[test]
fn command_may_write_the_input_during_execute() -> Result<(), ProcessError> {
    use std::sync::mpsc;
    use std::time::Duration;

    let image = Image::new(&[4, 4, 3], PixelId::UInt8)?;
    let alias = Arc::new(parking_lot::Mutex::new(image.shallow_copy()));

    let filter = ShiftScaleFilter::new().with_shift(1.0);
    let writer = Arc::clone(&alias);
    let command = Command::new(move || {
        let _ = writer.lock().set_pixel_as_u8(&[0, 0, 0], 7);
    });
    filter.add_command(EventKind::Progress, &command)?;

    let (tx, rx) = mpsc::channel();
    let input = image.shallow_copy();
    std::thread::spawn(move || {
        let _ = tx.send(filter.execute(&input));
    });
    let output = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("execute did not finish")?;

    // the run reads the pixels as they were when it started
    assert_eq!(output.get_pixel_as_u8(&[0, 0, 0])?, 1);
    assert_eq!(image.get_pixel_as_u8(&[0, 0, 0])?, 7);
    drop(command);
    Ok(())
}
