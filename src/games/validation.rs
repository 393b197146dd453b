//! Shape and range checks for game payloads.
//!
//! Payloads are inspected as raw JSON so that every offending field is
//! reported at once, instead of stopping at the first deserialization error.
//! Nothing here touches storage; a payload that fails validation never
//! reaches a store.

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

use crate::config::GameRules;
use crate::games::model::{default_image_url, Difficulty, GamePatch, NewGame};

const CREATE_FIELDS: &[&str] = &[
    "externalId",
    "title",
    "category",
    "difficulty",
    "hoursPlayed",
    "progressPercent",
    "imageUrl",
];
const UPDATE_FIELDS: &[&str] = &["hoursPlayed", "progressPercent", "difficulty"];
const VISIBILITY_FIELDS: &[&str] = &["isPublic"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Violations(pub Vec<FieldViolation>);

impl Violations {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldViolation::new(field, message)])
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    pub fn check(self) -> Result<(), Violations> {
        self.finish(|| ())
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.field.as_str()).collect()
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Violations> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

/// Validates create, update and visibility payloads against [`GameRules`].
#[derive(Debug, Clone)]
pub struct GameValidator {
    rules: GameRules,
}

impl GameValidator {
    pub fn new(rules: GameRules) -> Self {
        Self { rules }
    }

    pub fn validate_create(&self, body: &Value) -> Result<NewGame, Violations> {
        let mut v = Violations::default();
        let Some(obj) = as_object(body, &mut v) else {
            return Err(v);
        };
        reject_unknown(obj, CREATE_FIELDS, &mut v);

        let external_id = required(obj, "externalId", &mut v).and_then(|x| external_id(x, &mut v));
        let title = required(obj, "title", &mut v).and_then(|x| self.title(x, &mut v));
        let category = required(obj, "category", &mut v)
            .and_then(|x| non_empty_string(x, "category", &mut v));
        let difficulty = required(obj, "difficulty", &mut v).and_then(|x| difficulty(x, &mut v));
        let hours_played = required(obj, "hoursPlayed", &mut v).and_then(|x| hours(x, &mut v));
        let progress_percent =
            required(obj, "progressPercent", &mut v).and_then(|x| progress(x, &mut v));
        let image_url = obj
            .get("imageUrl")
            .filter(|x| !x.is_null())
            .and_then(|x| image_url(x, &mut v));

        v.finish(|| {
            let external_id = external_id.unwrap_or_default();
            NewGame {
                external_id,
                title: title.unwrap_or_default(),
                category: category.unwrap_or_default(),
                difficulty: difficulty.unwrap_or(Difficulty::Easy),
                hours_played: hours_played.unwrap_or_default(),
                progress_percent: progress_percent.unwrap_or_default(),
                image_url: image_url.unwrap_or_else(|| {
                    default_image_url(&self.rules.image_url_template, external_id)
                }),
            }
        })
    }

    pub fn validate_update(&self, body: &Value) -> Result<GamePatch, Violations> {
        let mut v = Violations::default();
        let Some(obj) = as_object(body, &mut v) else {
            return Err(v);
        };
        reject_unknown(obj, UPDATE_FIELDS, &mut v);

        let patch = GamePatch {
            hours_played: obj.get("hoursPlayed").and_then(|x| hours(x, &mut v)),
            progress_percent: obj.get("progressPercent").and_then(|x| progress(x, &mut v)),
            difficulty: obj.get("difficulty").and_then(|x| difficulty(x, &mut v)),
        };
        if v.0.is_empty() && !UPDATE_FIELDS.iter().any(|f| obj.contains_key(*f)) {
            v.push(
                "body",
                format!("must contain at least one of: {}", UPDATE_FIELDS.join(", ")),
            );
        }
        v.finish(|| patch)
    }

    pub fn validate_visibility(&self, body: &Value) -> Result<bool, Violations> {
        let mut v = Violations::default();
        let Some(obj) = as_object(body, &mut v) else {
            return Err(v);
        };
        reject_unknown(obj, VISIBILITY_FIELDS, &mut v);
        let flag = required(obj, "isPublic", &mut v).and_then(|x| match x.as_bool() {
            Some(b) => Some(b),
            None => {
                v.push("isPublic", "must be a boolean");
                None
            }
        });
        v.finish(|| flag.unwrap_or_default())
    }

    fn title(&self, value: &Value, v: &mut Violations) -> Option<String> {
        let title = non_empty_string(value, "title", v)?;
        let len = title.chars().count();
        if len > self.rules.max_title_len {
            v.push(
                "title",
                format!(
                    "must be at most {} characters (got {len})",
                    self.rules.max_title_len
                ),
            );
            return None;
        }
        Some(title)
    }
}

fn as_object<'a>(body: &'a Value, v: &mut Violations) -> Option<&'a Map<String, Value>> {
    let obj = body.as_object();
    if obj.is_none() {
        v.push("body", "must be a JSON object");
    }
    obj
}

fn reject_unknown(obj: &Map<String, Value>, allowed: &[&str], v: &mut Violations) {
    for key in obj.keys().filter(|k| !allowed.contains(&k.as_str())) {
        v.push(key, "is not allowed");
    }
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str, v: &mut Violations) -> Option<&'a Value> {
    let value = obj.get(field);
    if value.is_none() {
        v.push(field, "is required");
    }
    value
}

fn non_empty_string(value: &Value, field: &str, v: &mut Violations) -> Option<String> {
    let Some(s) = value.as_str() else {
        v.push(field, "must be a string");
        return None;
    };
    let trimmed = s.trim();
    if trimmed.is_empty() {
        v.push(field, "must not be empty");
        return None;
    }
    Some(trimmed.to_string())
}

fn external_id(value: &Value, v: &mut Violations) -> Option<i64> {
    match value.as_i64() {
        Some(id) if id > 0 => Some(id),
        Some(_) => {
            v.push("externalId", "must be a positive integer");
            None
        }
        None => {
            v.push("externalId", "must be an integer");
            None
        }
    }
}

fn difficulty(value: &Value, v: &mut Violations) -> Option<Difficulty> {
    let parsed = value.as_str().and_then(Difficulty::parse);
    if parsed.is_none() {
        v.push("difficulty", "must be one of: easy, medium, hard");
    }
    parsed
}

fn number(value: &Value, field: &str, v: &mut Violations) -> Option<f64> {
    let n = value.as_f64().filter(|n| n.is_finite());
    if n.is_none() {
        v.push(field, "must be a number");
    }
    n
}

fn hours(value: &Value, v: &mut Violations) -> Option<f64> {
    let n = number(value, "hoursPlayed", v)?;
    if n < 0.0 {
        v.push("hoursPlayed", "must be greater than or equal to 0");
        return None;
    }
    Some(n)
}

fn progress(value: &Value, v: &mut Violations) -> Option<f64> {
    let n = number(value, "progressPercent", v)?;
    if !(0.0..=100.0).contains(&n) {
        v.push("progressPercent", "must be between 0 and 100");
        return None;
    }
    Some(n)
}

fn image_url(value: &Value, v: &mut Violations) -> Option<String> {
    let Some(raw) = value.as_str() else {
        v.push("imageUrl", "must be a string");
        return None;
    };
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Some(raw.trim().to_string())
        }
        _ => {
            v.push("imageUrl", "must be a valid http(s) URL");
            None
        }
    }
}
