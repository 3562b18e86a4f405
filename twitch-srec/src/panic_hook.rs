use std::any::Any;
use std::panic::{PanicHookInfo, take_hook};
use std::thread;

/// Route panics through `tracing` before the default hook prints them.
///
/// A panicking target task is restarted by the scheduler; this makes sure the
/// cause also lands in the log file.
pub fn install() {
    let previous_hook = take_hook();

    std::panic::set_hook(Box::new(move |panic_info: &PanicHookInfo<'_>| {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let location = panic_info
                .location()
                .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
                .unwrap_or_else(|| "<unknown>".to_string());
            let thread_name = thread::current()
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| "<unnamed>".to_string());

            tracing::error!(
                target: "twitch_srec::panic",
                thread = %thread_name,
                %location,
                "panic: {}",
                payload_text(panic_info.payload())
            );
        }));

        previous_hook(panic_info);
    }));
}

fn payload_text(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        return (*s).to_string();
    }
    if let Some(s) = payload.downcast_ref::<String>() {
        return s.clone();
    }
    "<non-string panic payload>".to_string()
}
