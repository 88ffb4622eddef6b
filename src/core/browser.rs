// Browser - Stateful HTTP session with HTML form and link navigation

use once_cell::sync::Lazy;
use reqwest::blocking::Client;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

use crate::error::{ExportError, Result};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

static FORM_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("form").expect("static selector"));
static CONTROL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("input, select, textarea").expect("static selector"));
static OPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("option").expect("static selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a").expect("static selector"));

/// Stateful web session: an HTTP client with a cookie jar plus optional
/// basic-auth credentials applied to every request.
pub struct Browser {
    client: Client,
    http_auth: Option<(String, String)>,
}

impl Browser {
    pub fn new(timeout: Duration, http_auth: Option<(String, String)>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, http_auth })
    }

    /// GET a page and parse it as HTML. Follows redirects; the returned page
    /// keeps the final URL so relative hrefs resolve correctly.
    pub fn open(&self, url: &str) -> Result<Page> {
        log::debug!("GET {}", url);
        let mut request = self.client.get(url);
        if let Some((user, pass)) = &self.http_auth {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send()?.error_for_status()?;
        let url = response.url().clone();
        let body = response.text()?;

        Ok(Page::parse(url, body))
    }

    /// Submit a form over the session with its current field values,
    /// urlencoded, honoring the form's method.
    pub fn submit(&self, form: &Form) -> Result<Response> {
        log::debug!(
            "{} {} ({} fields)",
            form.method.to_uppercase(),
            form.action,
            form.fields.len()
        );

        let mut request = if form.method.eq_ignore_ascii_case("post") {
            self.client.post(form.action.clone()).form(&form.fields)
        } else {
            self.client.get(form.action.clone()).query(&form.fields)
        };
        if let Some((user, pass)) = &self.http_auth {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send()?.error_for_status()?;
        let url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes()?.to_vec();

        Ok(Response {
            url,
            status,
            headers,
            body,
        })
    }
}

/// A fetched and parsed HTML page.
pub struct Page {
    url: Url,
    raw: String,
    html: Html,
}

impl Page {
    pub fn parse(url: Url, body: String) -> Self {
        let html = Html::parse_document(&body);
        Self {
            url,
            raw: body,
            html,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw body text, for marker checks.
    pub fn contains(&self, marker: &str) -> bool {
        self.raw.contains(marker)
    }

    /// Find a form by its `name` attribute and capture its submittable state:
    /// method, resolved action URL and the browser-default field set.
    pub fn form(&self, name: &str) -> Result<Form> {
        let element = self
            .html
            .select(&FORM_SELECTOR)
            .find(|el| el.value().attr("name") == Some(name))
            .ok_or_else(|| {
                ExportError::navigation(format!("no form named '{}' on {}", name, self.url))
            })?;

        Form::from_element(name, &element, &self.url)
    }

    /// Find the first hyperlink whose visible text contains `pattern`
    /// (case-sensitive) and resolve its href against the page URL.
    pub fn link_by_text(&self, pattern: &str) -> Result<Url> {
        for link in self.html.select(&LINK_SELECTOR) {
            let text: String = link.text().collect();
            if !text.contains(pattern) {
                continue;
            }
            if let Some(href) = link.value().attr("href") {
                return self.url.join(href).map_err(|e| {
                    ExportError::navigation(format!("link '{}' has invalid href: {}", pattern, e))
                });
            }
        }

        Err(ExportError::navigation(format!(
            "no link matching '{}' on {}",
            pattern, self.url
        )))
    }
}

/// An HTML form ready for submission. Holds the successful field set a
/// browser would submit: text/password/hidden inputs, checked radios and
/// checkboxes, select defaults and textareas, in document order.
#[derive(Debug, Clone)]
pub struct Form {
    name: String,
    action: Url,
    method: String,
    fields: Vec<(String, String)>,
    // Allowed values per radio group / select control
    options: Vec<(String, Vec<String>)>,
}

impl Form {
    fn from_element(name: &str, element: &ElementRef, page_url: &Url) -> Result<Self> {
        let action = match element.value().attr("action") {
            Some(action) if !action.is_empty() => page_url.join(action).map_err(|e| {
                ExportError::navigation(format!("form '{}' has invalid action: {}", name, e))
            })?,
            _ => page_url.clone(),
        };
        let method = element
            .value()
            .attr("method")
            .unwrap_or("get")
            .to_lowercase();

        let mut form = Self {
            name: name.to_string(),
            action,
            method,
            fields: Vec::new(),
            options: Vec::new(),
        };

        for control in element.select(&CONTROL_SELECTOR) {
            form.collect_control(&control);
        }

        Ok(form)
    }

    fn collect_control(&mut self, control: &ElementRef) {
        let tag = control.value().name();
        let Some(control_name) = control.value().attr("name") else {
            return;
        };
        let control_name = control_name.to_string();

        match tag {
            "input" => {
                let input_type = control.value().attr("type").unwrap_or("text");
                let value = control.value().attr("value").unwrap_or("").to_string();

                match input_type {
                    "radio" => {
                        let value = if value.is_empty() { "on".into() } else { value };
                        self.record_option(&control_name, value.clone());
                        if control.value().attr("checked").is_some() {
                            self.fields.push((control_name, value));
                        }
                    }
                    "checkbox" => {
                        if control.value().attr("checked").is_some() {
                            let value = if value.is_empty() { "on".into() } else { value };
                            self.fields.push((control_name, value));
                        }
                    }
                    // Buttons only submit when clicked; files never do here
                    "submit" | "button" | "image" | "reset" | "file" => {}
                    _ => self.fields.push((control_name, value)),
                }
            }
            "select" => {
                let mut values = Vec::new();
                let mut selected = None;
                for option in control.select(&OPTION_SELECTOR) {
                    let value = option
                        .value()
                        .attr("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| option.text().collect::<String>().trim().to_string());
                    if option.value().attr("selected").is_some() && selected.is_none() {
                        selected = Some(value.clone());
                    }
                    values.push(value);
                }
                // Browsers fall back to the first option when none is selected
                let chosen = selected.or_else(|| values.first().cloned());
                self.options.push((control_name.clone(), values));
                if let Some(value) = chosen {
                    self.fields.push((control_name, value));
                }
            }
            "textarea" => {
                let value: String = control.text().collect();
                self.fields.push((control_name, value));
            }
            _ => {}
        }
    }

    fn record_option(&mut self, name: &str, value: String) {
        if let Some((_, values)) = self.options.iter_mut().find(|(n, _)| n == name) {
            values.push(value);
        } else {
            self.options.push((name.to_string(), vec![value]));
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &Url {
        &self.action
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Set a field value, overriding the parsed default. Fields absent from
    /// the document (disabled or login-variant inputs) are appended.
    pub fn set(&mut self, name: &str, value: &str) {
        if let Some(field) = self.fields.iter_mut().find(|(n, _)| n == name) {
            field.1 = value.to_string();
        } else {
            self.fields.push((name.to_string(), value.to_string()));
        }
    }

    /// Select an option on a radio group or `<select>` control. Unlike
    /// `set`, the control and the option must both exist in the document.
    pub fn select(&mut self, name: &str, value: &str) -> Result<()> {
        let values = self
            .options
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values)
            .ok_or_else(|| {
                ExportError::navigation(format!("form '{}' has no '{}' control", self.name, name))
            })?;

        if !values.iter().any(|v| v == value) {
            return Err(ExportError::navigation(format!(
                "control '{}' of form '{}' has no option '{}'",
                name, self.name, value
            )));
        }

        self.set(name, value);
        Ok(())
    }
}

/// A raw form-submission response: final URL, status, headers and body bytes.
pub struct Response {
    url: Url,
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Reinterpret the response as an HTML page for further navigation.
    pub fn into_page(self) -> Page {
        let body = String::from_utf8_lossy(&self.body).into_owned();
        Page::parse(self.url, body)
    }
}
