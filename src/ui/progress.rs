use indicatif::{ProgressBar, ProgressStyle};

pub fn create_event_spinner(port: u32) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{prefix:.bold.dim} {spinner} {pos} events {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_prefix(format!("Port {}", port));
    pb
}
