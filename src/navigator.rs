use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::locator::{find_first, FieldTarget, Matcher};
use crate::utils::error::{AppError, Result};

/// Labels the form shows in place of a real choice; never shift options.
const PLACEHOLDER_LABELS: &[&str] = &["Select", "Wybierz", "Выбрать"];

const PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(15);
const FIELD_TIMEOUT: Duration = Duration::from_secs(5);
const NEXT_PRIMARY_TIMEOUT: Duration = Duration::from_secs(5);
const NEXT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(3);
const NEXT_BACKOFF: Duration = Duration::from_secs(2);
const NEXT_RETRY_CYCLES: usize = 3;
const PAGE_SETTLE: Duration = Duration::from_millis(500);
const DROPDOWN_RENDER_DELAY: Duration = Duration::from_millis(500);
const CLEAR_TIMEOUT: Duration = Duration::from_secs(2);

const EMAIL_FIELD: FieldTarget = FieldTarget {
    name: "email input",
    candidates: &[
        Matcher::Label {
            pool: "input",
            pattern: r"Elektroniczna|E-?mail|Электронн",
        },
        Matcher::Css(r#"input[type="email"]"#),
        Matcher::Css(r#"input[aria-label*="mail" i]"#),
        Matcher::Css(r#"input[aria-label*="почт" i]"#),
    ],
};

const NAME_FIELD: FieldTarget = FieldTarget {
    name: "name input",
    candidates: &[
        Matcher::Label {
            pool: r#"input[type="text"]"#,
            pattern: r"Imi[ęe] Nazwisko|First and Last name|Имя",
        },
        Matcher::NthCss(r#"input[type="text"]"#, 0),
    ],
};

const COURIER_ID_FIELD: FieldTarget = FieldTarget {
    name: "courier id input",
    candidates: &[
        Matcher::Label {
            pool: r#"input[type="text"]"#,
            pattern: r"Podaj swoje ID|Please provide your ID|ID|ид",
        },
        Matcher::NthCss(r#"input[type="text"]"#, 1),
    ],
};

const ACCEPT_SHIFTS_RADIO: FieldTarget = FieldTarget {
    name: "accept shifts radio",
    candidates: &[
        Matcher::Label {
            pool: r#"[role="radio"]"#,
            pattern: r"Chcę przyjąć|I want to accept",
        },
        Matcher::NthCss(r#"div[role="radiogroup"] [role="radio"]"#, 1),
    ],
};

const CITY_RADIO: FieldTarget = FieldTarget {
    name: "city radio",
    candidates: &[Matcher::Label {
        pool: r#"[role="radio"]"#,
        pattern: r"Wrocław|Wroclaw",
    }],
};

const NEXT_PRIMARY: FieldTarget = FieldTarget {
    name: "next button",
    candidates: &[Matcher::Label {
        pool: r#"div[role="button"]"#,
        pattern: r"Dalej|Next|Далее",
    }],
};

const NEXT_FALLBACK: FieldTarget = FieldTarget {
    name: "next button (fallback)",
    candidates: &[Matcher::Label {
        pool: r#"button, [role="button"]"#,
        pattern: r"Dalej|Next|Далее",
    }],
};

const SHIFTS_DROPDOWN: FieldTarget = FieldTarget {
    name: "shifts dropdown",
    candidates: &[
        Matcher::Label {
            pool: r#"[role="listbox"], [role="combobox"]"#,
            pattern: r"Wybierz|Select|Выбрать",
        },
        Matcher::Css(r#"[role="combobox"]"#),
        Matcher::Css(r#"[role="listbox"]"#),
    ],
};

const CLEAR_FORM_BUTTON: FieldTarget = FieldTarget {
    name: "clear form button",
    candidates: &[Matcher::Label {
        pool: r#"button, [role="button"]"#,
        pattern: r"Wyczyść|Clear form|Очистить",
    }],
};

/// Drives one complete pass over the four-page sign-up form and returns the
/// shift options currently offered in the final dropdown.
pub struct FormNavigator {
    form_url: String,
    email: String,
    name: String,
    courier_id: String,
    headless: bool,
    chrome_path: Option<String>,
    debug_screenshots: bool,
    screenshot_dir: PathBuf,
}

impl FormNavigator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            form_url: config.form_url.clone(),
            email: config.email.clone(),
            name: config.name.clone(),
            courier_id: config.courier_id.to_string(),
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            debug_screenshots: config.debug_screenshots,
            screenshot_dir: config.screenshot_dir.clone(),
        }
    }

    /// Run one complete form pass. The browser process lives only for the
    /// duration of this call and is torn down on every exit path.
    pub fn check_once(&self) -> Result<Vec<String>> {
        let browser = self.launch_browser()?;
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {e}")))?;

        let result = self.drive_form(&tab);
        if result.is_err() && self.debug_screenshots {
            self.capture_failure_screenshot(&tab);
        }

        let _ = tab.close(true);
        result
    }

    fn drive_form(&self, tab: &Tab) -> Result<Vec<String>> {
        tab.navigate_to(&self.form_url)
            .map_err(|e| AppError::Browser(format!("Navigation to form failed: {e}")))?;
        tab.wait_until_navigated()
            .map_err(|e| AppError::Browser(format!("Page load failed: {e}")))?;
        tab.wait_for_element_with_custom_timeout(r#"input, div[role="button"]"#, PAGE_LOAD_TIMEOUT)
            .map_err(|e| AppError::Browser(format!("Form did not render: {e}")))?;

        debug!("Page 1: filling email");
        self.fill(tab, &EMAIL_FIELD, &self.email)?;
        self.click_next(tab)?;

        debug!("Page 2: filling name and courier id");
        self.fill(tab, &NAME_FIELD, &self.name)?;
        self.fill(tab, &COURIER_ID_FIELD, &self.courier_id)?;
        self.click(tab, &ACCEPT_SHIFTS_RADIO)?;
        self.click_next(tab)?;

        debug!("Page 3: selecting city");
        self.click(tab, &CITY_RADIO)?;
        self.click_next(tab)?;

        debug!("Page 4: reading shift options");
        let options = self.collect_shift_options(tab)?;

        self.clear_form(tab);

        Ok(options)
    }

    fn fill(&self, tab: &Tab, field: &FieldTarget, value: &str) -> Result<()> {
        let element = find_first(tab, field, FIELD_TIMEOUT)?;
        element
            .type_into(value)
            .map_err(|e| AppError::Browser(format!("Could not fill {}: {e}", field.name)))?;
        Ok(())
    }

    fn click(&self, tab: &Tab, field: &FieldTarget) -> Result<()> {
        let element = find_first(tab, field, FIELD_TIMEOUT)?;
        element
            .click()
            .map_err(|e| AppError::Browser(format!("Could not click {}: {e}", field.name)))?;
        Ok(())
    }

    /// Advance to the next form page: primary locator, then the generic
    /// button-role fallback, then a backoff wait, up to three full cycles.
    fn click_next(&self, tab: &Tab) -> Result<()> {
        for cycle in 0..NEXT_RETRY_CYCLES {
            for (field, timeout) in [
                (&NEXT_PRIMARY, NEXT_PRIMARY_TIMEOUT),
                (&NEXT_FALLBACK, NEXT_FALLBACK_TIMEOUT),
            ] {
                match find_first(tab, field, timeout) {
                    Ok(element) => match element.click() {
                        Ok(_) => {
                            std::thread::sleep(PAGE_SETTLE);
                            return Ok(());
                        }
                        Err(e) => warn!("{} found but not clickable: {}", field.name, e),
                    },
                    Err(_) => debug!("{} not found within {:?}", field.name, timeout),
                }
            }
            if cycle + 1 < NEXT_RETRY_CYCLES {
                std::thread::sleep(NEXT_BACKOFF);
            }
        }
        Err(AppError::Navigation(format!(
            "next control not clickable after {NEXT_RETRY_CYCLES} retries"
        )))
    }

    fn collect_shift_options(&self, tab: &Tab) -> Result<Vec<String>> {
        let dropdown = find_first(tab, &SHIFTS_DROPDOWN, FIELD_TIMEOUT)?;
        dropdown
            .click()
            .map_err(|e| AppError::Browser(format!("Could not open shifts dropdown: {e}")))?;
        std::thread::sleep(DROPDOWN_RENDER_DELAY);

        let html = tab
            .get_content()
            .map_err(|e| AppError::Browser(format!("Failed to get page content: {e}")))?;
        options_from_html(&html)
    }

    /// Best-effort form reset so the next cycle starts clean. Failures are
    /// logged and ignored.
    fn clear_form(&self, tab: &Tab) {
        match find_first(tab, &CLEAR_FORM_BUTTON, CLEAR_TIMEOUT) {
            Ok(element) => {
                if let Err(e) = element.click() {
                    debug!("Form clear skipped: {}", e);
                }
            }
            Err(_) => debug!("Form clear control not present"),
        }
    }

    fn launch_browser(&self) -> Result<Browser> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(self.headless)
            .sandbox(false)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {e}")))?;

        if let Some(chrome_path) = &self.chrome_path {
            launch_options.path = Some(PathBuf::from(chrome_path));
        }

        Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {e}")))
    }

    fn capture_failure_screenshot(&self, tab: &Tab) {
        let data = match tab.capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        {
            Ok(data) => data,
            Err(e) => {
                warn!("Screenshot capture failed: {}", e);
                return;
            }
        };

        if let Err(e) = std::fs::create_dir_all(&self.screenshot_dir) {
            warn!("Failed to create screenshot directory: {}", e);
            return;
        }

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let filename = format!("failure_{}_{}.png", timestamp, uuid::Uuid::new_v4().simple());
        let path = self.screenshot_dir.join(filename);

        match std::fs::write(&path, data) {
            Ok(()) => info!("Saved failure screenshot to {}", path.display()),
            Err(e) => warn!("Failed to write screenshot: {}", e),
        }
    }
}

/// Extract the dropdown's option labels from a page snapshot.
pub fn options_from_html(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"[role="option"]"#)
        .map_err(|e| AppError::Browser(format!("Invalid option selector: {e:?}")))?;

    let raw = document
        .select(&selector)
        .map(|element| element.text().collect::<Vec<_>>().join(" ").trim().to_string());
    Ok(filter_options(raw))
}

/// Drop empty labels and the locale placeholder entries.
pub fn filter_options<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    raw.into_iter()
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty() && !is_placeholder(label))
        .collect()
}

fn is_placeholder(label: &str) -> bool {
    PLACEHOLDER_LABELS
        .iter()
        .any(|placeholder| label.to_lowercase() == placeholder.to_lowercase())
}
