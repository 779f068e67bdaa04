use std::path::Path;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{info, warn};

use crate::db;
use crate::error::PreconditionError;
use crate::fetch::Fetch;
use crate::parser::{Extract, HealthFields};

const ERROR_TITLE: &str = "steam community :: error";
const EXPECTED_APP: &str = "rust";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorType {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "appName")]
    AppName,
}

/// One report line. Field names match the report consumers already read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthError {
    #[serde(rename = "skinID")]
    pub skin_row_id: i64,
    #[serde(rename = "Page Title")]
    pub text: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Error Type")]
    pub error_type: ErrorType,
}

#[derive(Debug, Default)]
pub struct HealthSummary {
    pub checked: usize,
    pub title_errors: usize,
    pub app_name_errors: usize,
    pub unreachable: usize,
    pub errors: Vec<HealthError>,
}

impl HealthSummary {
    pub fn print(&self) {
        if !self.errors.is_empty() {
            println!("\nErrors were found while running skins check");
        }
        println!("Checked:          {}", self.checked);
        println!("Title errors:     {}", self.title_errors);
        println!("App name errors:  {}", self.app_name_errors);
        println!("Unreachable:      {}", self.unreachable);
    }
}

/// True for Steam's generic error page, whatever the casing.
pub fn title_indicates_error(title: &str) -> bool {
    title.to_lowercase().contains(ERROR_TITLE)
}

/// Both checks run independently; a page can fail neither, either or both.
pub fn classify(fields: &HealthFields) -> Vec<ErrorType> {
    let mut found = Vec::new();
    if title_indicates_error(&fields.title) {
        found.push(ErrorType::Title);
    }
    if !fields.app_name.to_lowercase().contains(EXPECTED_APP) {
        found.push(ErrorType::AppName);
    }
    found
}

pub fn check_range(min: i64, max: i64, last: i64) -> Result<(), PreconditionError> {
    if max > last {
        return Err(PreconditionError::MaxAboveStore { max, last });
    }
    if min < 1 {
        return Err(PreconditionError::MinBelowOne(min));
    }
    if min > max {
        return Err(PreconditionError::Inverted { min, max });
    }
    Ok(())
}

pub fn run(
    conn: &Connection,
    fetcher: &impl Fetch,
    extractor: &impl Extract,
    min: i64,
    max: i64,
) -> Result<HealthSummary> {
    let last = db::max_skin_row_id(conn)?;
    info!("Max range id in database: {}", last);
    check_range(min, max, last)?;

    let skins = db::fetch_skins_in_range(conn, min, max)?;
    let mut summary = HealthSummary::default();

    let pb = ProgressBar::new(skins.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    for skin in skins {
        info!(id = skin.id, skin_id = %skin.skin_id, url = %skin.url, "Checking skin page");
        pb.inc(1);

        let html = match fetcher.fetch_ok(&skin.url) {
            Ok(html) => html,
            Err(e) => {
                warn!("{}", e);
                summary.unreachable += 1;
                continue;
            }
        };
        summary.checked += 1;

        let fields = extractor.health(&html);
        let found = classify(&fields);
        if found.is_empty() {
            info!("Skin page is not returning any errors");
        }
        for error_type in found {
            let text = match error_type {
                ErrorType::Title => {
                    summary.title_errors += 1;
                    warn!(title = %fields.title, "Title contains the Steam error marker");
                    fields.title.clone()
                }
                ErrorType::AppName => {
                    summary.app_name_errors += 1;
                    warn!(app_name = %fields.app_name, "App name does not contain '{}'", EXPECTED_APP);
                    fields.app_name.clone()
                }
            };
            summary.errors.push(HealthError {
                skin_row_id: skin.id,
                text,
                url: skin.url.clone(),
                error_type,
            });
        }
    }

    pb.finish_and_clear();
    Ok(summary)
}

/// Pretty-printed JSON array; slashes and unicode are written as-is.
pub fn write_report(path: &Path, errors: &[HealthError]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let json = serde_json::to_string_pretty(errors)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Saved {} errors to {:?}", errors.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::{item, memory, skin};
    use crate::db::{insert_item, insert_skin};
    use crate::fetch::stub::StubFetcher;
    use crate::parser::HtmlExtractor;

    fn fields(title: &str, app: &str) -> HealthFields {
        HealthFields {
            title: title.to_lowercase(),
            app_name: app.to_lowercase(),
        }
    }

    fn page(title: &str, app: &str) -> String {
        format!(
            r#"<html><head><title>{}</title></head><body>
               <div class="apphub_HeaderTop"><div class="apphub_AppName">{}</div></div>
               </body></html>"#,
            title, app
        )
    }

    fn store_with_skins(n: usize) -> Connection {
        let conn = memory();
        insert_item(&conn, &item("Hoodie Skin", "hoodie")).unwrap();
        for i in 1..=n {
            insert_skin(&conn, &skin(1, &i.to_string())).unwrap();
        }
        conn
    }

    fn url(n: usize) -> String {
        format!("https://steamcommunity.com/sharedfiles/filedetails/?id={}", n)
    }

    #[test]
    fn classification() {
        assert_eq!(classify(&fields("Steam Community :: Error", "Rust")), vec![ErrorType::Title]);
        assert_eq!(classify(&fields("Steam Workshop::Cap", "PUBG")), vec![ErrorType::AppName]);
        assert!(classify(&fields("Steam Workshop::Cap", "Rust")).is_empty());
        assert_eq!(
            classify(&fields("Steam Community :: Error", "")),
            vec![ErrorType::Title, ErrorType::AppName]
        );
    }

    #[test]
    fn range_preconditions() {
        assert_eq!(check_range(1, 5, 5), Ok(()));
        assert_eq!(
            check_range(1, 6, 5),
            Err(PreconditionError::MaxAboveStore { max: 6, last: 5 })
        );
        assert_eq!(check_range(0, 5, 5), Err(PreconditionError::MinBelowOne(0)));
        assert_eq!(
            check_range(4, 2, 5),
            Err(PreconditionError::Inverted { min: 4, max: 2 })
        );
    }

    #[test]
    fn max_above_store_aborts_before_fetching() {
        let conn = store_with_skins(2);
        let fetcher = StubFetcher::default();
        let err = run(&conn, &fetcher, &HtmlExtractor::steam(), 1, 3).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::MaxAboveStore { .. })
        ));
        assert!(fetcher.requested().is_empty());
    }

    #[test]
    fn zero_min_aborts_before_fetching() {
        let conn = store_with_skins(2);
        let fetcher = StubFetcher::default();
        let err = run(&conn, &fetcher, &HtmlExtractor::steam(), 0, 2).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PreconditionError>(),
            Some(PreconditionError::MinBelowOne(0))
        ));
        assert!(fetcher.requested().is_empty());
    }

    #[test]
    fn scan_records_each_error_and_keeps_going() {
        let conn = store_with_skins(4);
        let fetcher = StubFetcher::default()
            .page(&url(1), &page("Steam Community :: Error", "Rust"))
            .page(&url(2), &page("Steam Workshop::Cap", "PUBG"))
            .unreachable(&url(3))
            .page(&url(4), &page("Steam Workshop::Hoodie", "Rust"));

        let s = run(&conn, &fetcher, &HtmlExtractor::steam(), 1, 4).unwrap();
        assert_eq!(fetcher.requested(), vec![url(1), url(2), url(3), url(4)]);
        assert_eq!(s.checked, 3);
        assert_eq!(s.title_errors, 1);
        assert_eq!(s.app_name_errors, 1);
        assert_eq!(s.unreachable, 1);
        assert_eq!(
            s.errors,
            vec![
                HealthError {
                    skin_row_id: 1,
                    text: "steam community :: error".into(),
                    url: url(1),
                    error_type: ErrorType::Title,
                },
                HealthError {
                    skin_row_id: 2,
                    text: "pubg".into(),
                    url: url(2),
                    error_type: ErrorType::AppName,
                },
            ]
        );
    }

    #[test]
    fn sub_range_only() {
        let conn = store_with_skins(3);
        let fetcher = StubFetcher::default();
        let s = run(&conn, &fetcher, &HtmlExtractor::steam(), 2, 2).unwrap();
        assert_eq!(fetcher.requested(), vec![url(2)]);
        assert_eq!(s.unreachable, 1);
        assert_eq!(s.checked, 0);
    }

    #[test]
    fn report_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/errors.json");
        let errors = vec![HealthError {
            skin_row_id: 7,
            text: "pubg".into(),
            url: "https://steamcommunity.com/sharedfiles/filedetails/?id=7".into(),
            error_type: ErrorType::AppName,
        }];
        write_report(&path, &errors).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("https://steamcommunity.com/sharedfiles/filedetails/?id=7"));
        let v: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(v[0]["skinID"], 7);
        assert_eq!(v[0]["Page Title"], "pubg");
        assert_eq!(v[0]["Error Type"], "appName");
    }

    #[test]
    fn clean_run_overwrites_previous_report() {
        let conn = store_with_skins(1);
        let fetcher = StubFetcher::default().page(&url(1), &page("Steam Workshop::Cap", "Rust"));
        let s = run(&conn, &fetcher, &HtmlExtractor::steam(), 1, 1).unwrap();
        assert!(s.errors.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("errors.json");
        std::fs::write(&path, r#"[{"skinID": 1}]"#).unwrap();
        write_report(&path, &s.errors).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
