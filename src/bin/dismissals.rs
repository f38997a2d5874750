//! Inspect the dismissal record of one client in a file-backed store.
//!
//! Usage: dismissals --dir DIR --client ID [--config PATH]
//!   --config PATH : also print the announcement this client would see

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use clap::Parser;

use console_header::{
    models::{announcement::Announcement, console_config::ConsoleConfig},
    services::{
        dismissals::{DismissalRecord, FileDismissalStore},
        selector::AnnouncementSelector,
    },
};

#[derive(Parser)]
#[command(name = "dismissals", about = "Show which announcements a client has dismissed")]
struct Args {
    /// Directory of the file dismissal store (DISMISSAL_DIR)
    #[arg(long, default_value = "./data/dismissals")]
    dir: PathBuf,

    /// Client id whose record to show
    #[arg(long)]
    client: String,

    /// Console config (deployment.config.json) used to compute the current selection
    #[arg(long)]
    config: Option<PathBuf>,
}

/// One line per dismissed announcement, sorted by id.
fn render(client: &str, path: &Path, record: &DismissalRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{client} ({})", path.display());
    if record.items.is_empty() {
        let _ = writeln!(out, "  no dismissed announcements");
    }
    for (id, dismissed_at) in &record.items {
        let _ = writeln!(out, "  {id}  dismissed {}", dismissed_at.to_rfc3339());
    }
    out
}

fn render_current(current: Option<&Announcement>) -> String {
    match current {
        Some(a) => format!("current: {} [{}] {}\n", a.id, a.color, a.message),
        None => "current: none\n".to_owned(),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .init();

    let args = Args::parse();

    let store = FileDismissalStore::open(&args.dir, &args.client)?;
    print!("{}", render(&args.client, store.path(), &store.record()));

    if let Some(path) = args.config {
        let console = ConsoleConfig::load(&path)?;
        let selector = AnnouncementSelector::with_announcements(store, console.announcements());
        print!("{}", render_current(selector.current()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use console_header::services::dismissals::DismissalStore;

    use super::*;

    #[test]
    fn renders_each_dismissal_with_its_time() {
        let mut record = DismissalRecord {
            client: "browser-1".into(),
            ..Default::default()
        };
        record
            .items
            .insert("a2".into(), Utc.with_ymd_and_hms(2026, 10, 2, 8, 30, 0).unwrap());
        record
            .items
            .insert("a1".into(), Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap());

        let out = render("browser-1", Path::new("data/browser-1.json"), &record);
        assert_eq!(
            out,
            "browser-1 (data/browser-1.json)\n\
             \x20 a1  dismissed 2026-10-01T09:00:00+00:00\n\
             \x20 a2  dismissed 2026-10-02T08:30:00+00:00\n"
        );
    }

    #[test]
    fn renders_empty_record() {
        let out = render("browser-1", Path::new("data/browser-1.json"), &DismissalRecord::default());
        assert!(out.ends_with("  no dismissed announcements\n"));
    }

    #[test]
    fn renders_current_selection() {
        let a = Announcement::new("a1", "Scheduled maintenance", "red");
        assert_eq!(render_current(Some(&a)), "current: a1 [red] Scheduled maintenance\n");
        assert_eq!(render_current(None), "current: none\n");
    }

    #[test]
    fn record_on_disk_drives_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileDismissalStore::open(dir.path(), "browser-1").unwrap();
        store.write_dismissed("a1").unwrap();

        let store = FileDismissalStore::open(dir.path(), "browser-1").unwrap();
        assert!(render("browser-1", store.path(), &store.record()).contains("  a1  dismissed "));

        let announcements = vec![
            Announcement::new("a1", "first", "red"),
            Announcement::new("a2", "second", "blue"),
        ];
        let selector = AnnouncementSelector::with_announcements(store, Some(announcements));
        assert_eq!(render_current(selector.current()), "current: a2 [blue] second\n");
    }
}
