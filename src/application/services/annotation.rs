//! Annotation manager
//!
//! Posts, updates or deletes annotations for each resolved target, one
//! blocking API call at a time. Per-target failures are reported as
//! outcomes and the batch continues; input errors abort before any call.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::application::input::load_targets;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    display_value, Action, Annotation, AnnotationSelector, AnnotationUpdate, DomainError,
    NewAnnotation, Target,
};
use crate::infrastructure::traits::{ApiClient, ApiResponse, FileSystem, HttpMethod};

/// Everything a run needs besides credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRequest {
    pub action: Action,
    /// Source identifier or path to a `.csv`/`.tsv` file
    pub source: String,
    /// Group visibility for posted annotations
    pub group_ids: Option<Vec<i64>>,
    pub origin: Option<String>,
    pub key: Option<String>,
    /// Raw value, coerced to a number when it parses as one
    pub value: Option<String>,
}

/// Which call of a target's workflow failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStep {
    /// Listing existing annotations (update/delete)
    Fetch,
    /// The post, put or delete call itself
    Write,
}

/// Result of processing one target (or one matched annotation).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Posted {
        obj_id: String,
        origin: String,
        key: String,
        value: Value,
    },
    Updated {
        obj_id: String,
        origin: String,
        key: String,
        old: Value,
        new: Value,
    },
    Deleted {
        obj_id: String,
        origin: String,
        key: String,
        value: Value,
    },
    NoMatch {
        obj_id: String,
        origin: String,
        key: String,
    },
    Failed {
        obj_id: String,
        action: Action,
        step: FailedStep,
        detail: String,
    },
    /// Run refused before reading input (origin or key unset).
    Rejected { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Outcome::Posted { .. } | Outcome::Updated { .. } | Outcome::Deleted { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. } | Outcome::Rejected { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Posted {
                obj_id,
                origin,
                key,
                value,
            } => write!(
                f,
                "Posted annotation {} ({} = {}) for {}",
                origin,
                key,
                display_value(value),
                obj_id
            ),
            Outcome::Updated {
                obj_id,
                origin,
                key,
                old,
                new,
            } => write!(
                f,
                "Updated annotation {} ({} = {} to {}) for {}",
                origin,
                key,
                display_value(old),
                display_value(new),
                obj_id
            ),
            Outcome::Deleted {
                obj_id,
                origin,
                key,
                value,
            } => write!(
                f,
                "Deleted annotation {} ({} = {}) for {}",
                origin,
                key,
                display_value(value),
                obj_id
            ),
            Outcome::NoMatch {
                obj_id,
                origin,
                key,
            } => write!(
                f,
                "Origin/key pair {}/{} did not match any existing annotations for {}.",
                origin, key, obj_id
            ),
            Outcome::Failed {
                obj_id,
                action,
                step: FailedStep::Fetch,
                detail,
            } => write!(
                f,
                "Did not {} - could not fetch annotations for {} ({}).",
                action, obj_id, detail
            ),
            Outcome::Failed {
                obj_id,
                action: Action::Post,
                step: FailedStep::Write,
                detail,
            } => write!(
                f,
                "Did not post annotation for {} ({}) - check inputs and existing annotations.",
                obj_id, detail
            ),
            Outcome::Failed {
                obj_id,
                action,
                step: FailedStep::Write,
                detail,
            } => write!(
                f,
                "Did not {} annotation for {} ({}) - check inputs.",
                action, obj_id, detail
            ),
            Outcome::Rejected { message } => f.write_str(message),
        }
    }
}

/// Ordered outcomes of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn unmatched(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::NoMatch { .. }))
            .count()
    }

    pub fn is_rejected(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o, Outcome::Rejected { .. }))
    }
}

/// Service applying an action to every target of a request.
pub struct AnnotationService {
    fs: Arc<dyn FileSystem>,
    api: Arc<dyn ApiClient>,
}

impl AnnotationService {
    pub fn new(fs: Arc<dyn FileSystem>, api: Arc<dyn ApiClient>) -> Self {
        Self { fs, api }
    }

    /// Run the request and collect all outcomes.
    pub fn run(&self, request: &AnnotationRequest) -> ApplicationResult<BatchReport> {
        self.run_with(request, |_| {})
    }

    /// Run the request, handing each outcome to `on_outcome` as soon as its
    /// target is done.
    #[instrument(
        skip(self, on_outcome),
        fields(action = %request.action, source = %request.source)
    )]
    pub fn run_with(
        &self,
        request: &AnnotationRequest,
        mut on_outcome: impl FnMut(&Outcome),
    ) -> ApplicationResult<BatchReport> {
        let mut report = BatchReport::default();
        let mut emit = |outcome: Outcome, report: &mut BatchReport| {
            on_outcome(&outcome);
            report.outcomes.push(outcome);
        };
        let action = request.action;

        let Some(origin) = non_blank(request.origin.as_deref()) else {
            let message = format!("please specify origin to {}", action);
            emit(Outcome::Rejected { message }, &mut report);
            return Ok(report);
        };
        let Some(key) = non_blank(request.key.as_deref()) else {
            let message = format!("please specify key to {}", action);
            emit(Outcome::Rejected { message }, &mut report);
            return Ok(report);
        };
        let selector = AnnotationSelector::new(origin, key);

        let targets = load_targets(
            self.fs.as_ref(),
            &request.source,
            action,
            key,
            request.value.as_deref(),
        )?;

        for target in &targets {
            debug!("processing {}", target.obj_id);
            let outcomes = if action.requires_existing() {
                self.apply_to_existing(action, target, &selector)?
            } else {
                vec![self.post(target, &selector, request.group_ids.clone())?]
            };
            for outcome in outcomes {
                emit(outcome, &mut report);
            }
        }

        info!(
            "{} target(s): {} succeeded, {} failed, {} unmatched",
            targets.len(),
            report.succeeded(),
            report.failed(),
            report.unmatched()
        );
        Ok(report)
    }

    fn post(
        &self,
        target: &Target,
        selector: &AnnotationSelector,
        group_ids: Option<Vec<i64>>,
    ) -> ApplicationResult<Outcome> {
        let value = required_value(target)?;
        let body = to_json(&NewAnnotation::new(
            &selector.origin,
            &selector.key,
            value.clone(),
            group_ids,
        ))?;

        let path = annotations_path(&target.obj_id);
        let outcome = match self.api.send(HttpMethod::Post, &path, Some(&body)) {
            Ok(response) if response.is_ok() => Outcome::Posted {
                obj_id: target.obj_id.clone(),
                origin: selector.origin.clone(),
                key: selector.key.clone(),
                value,
            },
            Ok(response) => write_failed(Action::Post, target, status_detail(&response)),
            Err(e) => write_failed(Action::Post, target, e.to_string()),
        };
        Ok(outcome)
    }

    /// Update or delete every annotation of `target` matching `selector`.
    fn apply_to_existing(
        &self,
        action: Action,
        target: &Target,
        selector: &AnnotationSelector,
    ) -> ApplicationResult<Vec<Outcome>> {
        let annotations = match self.fetch(&target.obj_id) {
            Ok(annotations) => annotations,
            Err(detail) => {
                return Ok(vec![Outcome::Failed {
                    obj_id: target.obj_id.clone(),
                    action,
                    step: FailedStep::Fetch,
                    detail,
                }])
            }
        };

        let matches = selector.filter(&annotations);
        debug!(
            "{}: {} of {} annotation(s) match {}/{}",
            target.obj_id,
            matches.len(),
            annotations.len(),
            selector.origin,
            selector.key
        );
        if matches.is_empty() {
            return Ok(vec![Outcome::NoMatch {
                obj_id: target.obj_id.clone(),
                origin: selector.origin.clone(),
                key: selector.key.clone(),
            }]);
        }

        matches
            .into_iter()
            .map(|annotation| match action {
                Action::Update => self.update(target, selector, annotation),
                _ => Ok(self.delete(target, selector, annotation)),
            })
            .collect()
    }

    fn update(
        &self,
        target: &Target,
        selector: &AnnotationSelector,
        annotation: &Annotation,
    ) -> ApplicationResult<Outcome> {
        let new = required_value(target)?;
        let body = to_json(&AnnotationUpdate::new(
            &selector.origin,
            &selector.key,
            new.clone(),
            &target.obj_id,
        ))?;

        let path = annotation_path(&target.obj_id, &annotation.id);
        let outcome = match self.api.send(HttpMethod::Put, &path, Some(&body)) {
            Ok(response) if response.is_ok() => Outcome::Updated {
                obj_id: target.obj_id.clone(),
                origin: annotation.origin.clone(),
                key: selector.key.clone(),
                old: annotation.value_of(&selector.key).cloned().unwrap_or_default(),
                new,
            },
            Ok(response) => write_failed(Action::Update, target, status_detail(&response)),
            Err(e) => write_failed(Action::Update, target, e.to_string()),
        };
        Ok(outcome)
    }

    fn delete(
        &self,
        target: &Target,
        selector: &AnnotationSelector,
        annotation: &Annotation,
    ) -> Outcome {
        let path = annotation_path(&target.obj_id, &annotation.id);
        match self.api.send(HttpMethod::Delete, &path, None) {
            Ok(response) if response.is_ok() => Outcome::Deleted {
                obj_id: target.obj_id.clone(),
                origin: annotation.origin.clone(),
                key: selector.key.clone(),
                value: annotation.value_of(&selector.key).cloned().unwrap_or_default(),
            },
            Ok(response) => write_failed(Action::Delete, target, status_detail(&response)),
            Err(e) => write_failed(Action::Delete, target, e.to_string()),
        }
    }

    /// All annotations of a source, or a failure detail for reporting.
    fn fetch(&self, obj_id: &str) -> Result<Vec<Annotation>, String> {
        let response = self
            .api
            .send(HttpMethod::Get, &annotations_path(obj_id), None)
            .map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(status_detail(&response));
        }
        parse_listing(obj_id, response.body).map_err(|e| e.to_string())
    }
}

/// Decode `{ "data": [ ... ] }` into annotations.
fn parse_listing(obj_id: &str, body: Value) -> Result<Vec<Annotation>, DomainError> {
    let invalid = |message: String| DomainError::InvalidAnnotation {
        obj_id: obj_id.to_string(),
        message,
    };
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data) => serde_json::from_value(data).map_err(|e| invalid(e.to_string())),
            None => Err(invalid("response has no 'data' field".to_string())),
        },
        other => Err(invalid(format!("expected a JSON object, got {}", other))),
    }
}

fn annotations_path(obj_id: &str) -> String {
    format!("/api/sources/{}/annotations", obj_id)
}

fn annotation_path(obj_id: &str, annotation_id: &str) -> String {
    format!("/api/sources/{}/annotations/{}", obj_id, annotation_id)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn required_value(target: &Target) -> ApplicationResult<Value> {
    target.value.clone().ok_or_else(|| {
        DomainError::MissingValue {
            obj_id: target.obj_id.clone(),
        }
        .into()
    })
}

fn to_json(body: &impl Serialize) -> ApplicationResult<Value> {
    serde_json::to_value(body).map_err(|e| ApplicationError::OperationFailed {
        context: "encode request body".to_string(),
        source: Box::new(e),
    })
}

fn status_detail(response: &ApiResponse) -> String {
    format!("HTTP {}", response.status)
}

fn write_failed(action: Action, target: &Target, detail: String) -> Outcome {
    Outcome::Failed {
        obj_id: target.obj_id.clone(),
        action,
        step: FailedStep::Write,
        detail,
    }
}
