//! Contact form submissions.
//!
//! A submission is validated, turned into an HTML notification for the site
//! operator and handed to a [`Dispatcher`]. The production dispatcher is an
//! SMTP relay ([`SmtpDispatcher`]); its credential comes from the environment
//! variable named in `contact.api_key_env`.
//!
//! ## Without a credential
//!
//! When the credential variable is unset the handler has no dispatcher. It
//! then writes the submission to the log and acknowledges it as
//! [`Acknowledgement::Recorded`], so the form keeps working on development and
//! preview deployments. This is not a delivery guarantee.
//!
//! ## Error surface
//!
//! | Condition | Error | Response |
//! |-----------|-------|----------|
//! | body is not JSON | [`ContactError::InvalidBody`] | 400 `Invalid request body` |
//! | required field empty | [`ContactError::Validation`] | 400 `Missing required fields` with field names |
//! | field present but malformed | [`ContactError::Validation`] | 400 `Invalid fields` with field names |
//! | dispatcher failed | [`ContactError::Delivery`] | 500 `Failed to send message` |
//!
//! Delivery errors keep the transport error as their `source` for logging; the
//! message shown to the submitter never includes it.

use crate::config::ContactConfig;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const NOT_PROVIDED: &str = "Not provided";
const NOT_SPECIFIED: &str = "Not specified";
const GENERAL_INQUIRY: &str = "General Inquiry";

#[derive(Error, Debug)]
pub enum ContactError {
    #[error("invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("invalid submission: {}", join_issues(.0))]
    Validation(Vec<FieldError>),
    #[error("failed to send message")]
    Delivery(#[source] DispatchError),
}

impl ContactError {
    /// Names of the fields that failed validation; empty for other errors.
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            ContactError::Validation(issues) => issues.iter().map(|i| i.field).collect(),
            _ => Vec::new(),
        }
    }
}

fn join_issues(issues: &[FieldError]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldProblem {
    Missing,
    Invalid,
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.problem {
            FieldProblem::Missing => write!(f, "{} is required", self.field),
            FieldProblem::Invalid => write!(f, "{} is invalid", self.field),
        }
    }
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("invalid address {0:?}: {1}")]
    Address(String, #[source] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Contact form payload as posted by the site (camelCase JSON).
///
/// Every field is optional at the type level so that missing and `null`
/// values reach [`Submission::validate`] instead of failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Submission {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
    pub phone: Option<String>,
    pub wechat: Option<String>,
    pub visa_type: Option<String>,
    pub state: Option<String>,
}

impl Submission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn from_json(body: &str) -> Result<Self, ContactError> {
        Ok(serde_json::from_str(body)?)
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_wechat(mut self, wechat: impl Into<String>) -> Self {
        self.wechat = Some(wechat.into());
        self
    }

    pub fn with_visa_type(mut self, visa_type: impl Into<String>) -> Self {
        self.visa_type = Some(visa_type.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Check required fields and the email address.
    ///
    /// Reports every problem at once, in form order.
    pub fn validate(&self) -> Result<(), ContactError> {
        let mut issues = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("email", &self.email),
            ("message", &self.message),
        ] {
            if provided(value).is_none() {
                issues.push(FieldError {
                    field,
                    problem: FieldProblem::Missing,
                });
            }
        }
        if provided(&self.email).is_some_and(|e| e.parse::<lettre::Address>().is_err()) {
            issues.push(FieldError {
                field: "email",
                problem: FieldProblem::Invalid,
            });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ContactError::Validation(issues))
        }
    }
}

/// Trimmed value, or `None` when absent or blank.
fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn text(value: &Option<String>) -> String {
    provided(value).unwrap_or_default().to_string()
}

/// A composed operator notification, ready for a [`Dispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
}

/// Outbound delivery of a notification.
pub trait Dispatcher: Send + Sync {
    fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError>;
}

/// Blocking SMTP relay dispatcher.
pub struct SmtpDispatcher {
    transport: SmtpTransport,
}

impl SmtpDispatcher {
    pub fn new(config: &ContactConfig, secret: String) -> Result<Self, DispatchError> {
        let credentials = Credentials::new(config.smtp_username.clone(), secret);
        let builder = if config.smtp_port == 465 {
            SmtpTransport::relay(&config.smtp_host)?
        } else {
            SmtpTransport::starttls_relay(&config.smtp_host)?
        };
        let transport = builder
            .port(config.smtp_port)
            .credentials(credentials)
            .build();
        Ok(Self { transport })
    }

    /// Build a dispatcher when the credential variable is set.
    ///
    /// Returns `Ok(None)` when it is unset or blank.
    pub fn from_env(config: &ContactConfig) -> Result<Option<Self>, DispatchError> {
        match std::env::var(&config.api_key_env) {
            Ok(secret) if !secret.trim().is_empty() => {
                tracing::info!(
                    host = %config.smtp_host,
                    port = config.smtp_port,
                    "contact notifications enabled"
                );
                Ok(Some(Self::new(config, secret.trim().to_string())?))
            }
            _ => {
                tracing::warn!(
                    var = %config.api_key_env,
                    "contact notifications disabled: credential variable not set"
                );
                Ok(None)
            }
        }
    }
}

impl Dispatcher for SmtpDispatcher {
    fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
        let message = Message::builder()
            .from(parse_mailbox(&notification.from)?)
            .to(parse_mailbox(&notification.to)?)
            .reply_to(parse_mailbox(&notification.reply_to)?)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(notification.html.clone())?;
        self.transport.send(&message)?;
        Ok(())
    }
}

fn parse_mailbox(value: &str) -> Result<Mailbox, DispatchError> {
    value
        .parse()
        .map_err(|e| DispatchError::Address(value.to_string(), e))
}

/// How a valid submission was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Handed to the dispatcher.
    Sent,
    /// No dispatcher configured; written to the log only.
    Recorded,
}

/// Validates submissions and forwards them to the site operator.
pub struct ContactHandler {
    recipient: String,
    sender: String,
    dispatcher: Option<Box<dyn Dispatcher>>,
}

impl ContactHandler {
    pub fn new(config: &ContactConfig, dispatcher: Option<Box<dyn Dispatcher>>) -> Self {
        Self {
            recipient: config.recipient.clone(),
            sender: config.sender.clone(),
            dispatcher,
        }
    }

    /// Handler using SMTP when the credential variable is set.
    pub fn from_config(config: &ContactConfig) -> Result<Self, DispatchError> {
        let dispatcher = SmtpDispatcher::from_env(config)?
            .map(|d| Box::new(d) as Box<dyn Dispatcher>);
        Ok(Self::new(config, dispatcher))
    }

    pub fn can_deliver(&self) -> bool {
        self.dispatcher.is_some()
    }

    pub fn handle(&self, submission: &Submission) -> Result<Acknowledgement, ContactError> {
        submission.validate()?;

        let Some(dispatcher) = &self.dispatcher else {
            tracing::warn!("no mail credential configured; recording submission instead of sending");
            tracing::info!(
                name = %text(&submission.name),
                email = %text(&submission.email),
                phone = %text(&submission.phone),
                wechat = %text(&submission.wechat),
                visa_type = %text(&submission.visa_type),
                state = %text(&submission.state),
                message = %text(&submission.message),
                "contact submission"
            );
            return Ok(Acknowledgement::Recorded);
        };

        let notification = self.compose(submission);
        match dispatcher.dispatch(&notification) {
            Ok(()) => {
                tracing::info!(subject = %notification.subject, "contact notification sent");
                Ok(Acknowledgement::Sent)
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to send contact notification");
                Err(ContactError::Delivery(e))
            }
        }
    }

    /// Build the operator notification for a (validated) submission.
    pub fn compose(&self, submission: &Submission) -> Notification {
        let name = text(&submission.name);
        let visa_type = provided(&submission.visa_type).unwrap_or(GENERAL_INQUIRY);
        Notification {
            from: self.sender.clone(),
            to: self.recipient.clone(),
            reply_to: text(&submission.email),
            subject: format!("Contact Form \u{2014} {visa_type} from {name}"),
            html: render_notification(submission).into_string(),
        }
    }
}

fn render_notification(s: &Submission) -> Markup {
    let rows = [
        ("Name", provided(&s.name).unwrap_or(NOT_PROVIDED)),
        ("Email", provided(&s.email).unwrap_or(NOT_PROVIDED)),
        ("Phone", provided(&s.phone).unwrap_or(NOT_PROVIDED)),
        ("WeChat", provided(&s.wechat).unwrap_or(NOT_PROVIDED)),
        ("Visa Type", provided(&s.visa_type).unwrap_or(NOT_SPECIFIED)),
        ("State", provided(&s.state).unwrap_or(NOT_PROVIDED)),
    ];
    html! {
        h2 style="color:#C0392B" { "New Contact Form Submission" }
        table style="border-collapse:collapse;width:100%;max-width:600px" {
            @for (label, value) in rows {
                tr {
                    td style="padding:8px 0;color:#666;width:140px" { strong { (label) } }
                    td { (value) }
                }
            }
        }
        hr style="border:none;border-top:1px solid #eee;margin:16px 0";
        p style="color:#666" { strong { "Message:" } }
        p style="white-space:pre-wrap" { (provided(&s.message).unwrap_or_default()) }
    }
}

/// HTTP-shaped outcome of a submission, for whatever serves the form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactResponse {
    #[serde(skip)]
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<&'static str>,
}

impl ContactResponse {
    pub fn from_result(result: &Result<Acknowledgement, ContactError>) -> Self {
        let (status, error) = match result {
            Ok(_) => {
                return Self {
                    status: 200,
                    success: Some(true),
                    error: None,
                    fields: Vec::new(),
                };
            }
            Err(ContactError::InvalidBody(_)) => (400, "Invalid request body"),
            Err(ContactError::Validation(issues))
                if issues.iter().any(|i| i.problem == FieldProblem::Invalid) =>
            {
                (400, "Invalid fields")
            }
            Err(ContactError::Validation(_)) => (400, "Missing required fields"),
            Err(ContactError::Delivery(_)) => (500, "Failed to send message"),
        };
        Self {
            status,
            success: None,
            error: Some(error.to_string()),
            fields: result.as_ref().err().map(ContactError::fields).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingDispatcher {
        sent: Arc<Mutex<Vec<Notification>>>,
    }

    impl Dispatcher for RecordingDispatcher {
        fn dispatch(&self, notification: &Notification) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct FailingDispatcher;

    impl Dispatcher for FailingDispatcher {
        fn dispatch(&self, _: &Notification) -> Result<(), DispatchError> {
            Err(parse_mailbox("smtp.resend.com rejected credentials").unwrap_err())
        }
    }

    fn li() -> Submission {
        Submission::new("Li", "li@example.com", "Hello, I need a visa.")
    }

    fn handler_with(dispatcher: Option<Box<dyn Dispatcher>>) -> ContactHandler {
        ContactHandler::new(&ContactConfig::default(), dispatcher)
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn valid_submission_without_phone() {
        assert!(li().validate().is_ok());
    }

    #[test]
    fn missing_email_is_named() {
        let s = Submission {
            email: None,
            ..li()
        };
        let err = s.validate().unwrap_err();
        assert_eq!(err.fields(), vec!["email"]);
        assert!(err.to_string().contains("email is required"));
    }

    #[test]
    fn blank_fields_count_as_missing() {
        let s = Submission::new("  ", "li@example.com", "\n\t");
        assert_eq!(s.validate().unwrap_err().fields(), vec!["name", "message"]);
    }

    #[test]
    fn all_missing_reported_in_form_order() {
        let err = Submission::default().validate().unwrap_err();
        assert_eq!(err.fields(), vec!["name", "email", "message"]);
    }

    #[test]
    fn malformed_email_is_invalid() {
        let s = Submission::new("Li", "not-an-email", "Hi");
        let err = s.validate().unwrap_err();
        match err {
            ContactError::Validation(issues) => {
                assert_eq!(
                    issues,
                    vec![FieldError {
                        field: "email",
                        problem: FieldProblem::Invalid
                    }]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    // =========================================================================
    // JSON payload
    // =========================================================================

    #[test]
    fn from_json_reads_camel_case_and_ignores_unknown_keys() {
        let s = Submission::from_json(
            r#"{"name":"Li","email":"li@example.com","message":"Hi","visaType":"Tourist Visa","state":"VA","utm":"x"}"#,
        )
        .unwrap();
        assert_eq!(s.visa_type.as_deref(), Some("Tourist Visa"));
        assert_eq!(s.state.as_deref(), Some("VA"));
        assert_eq!(s.phone, None);
    }

    #[test]
    fn from_json_null_required_field_fails_validation_not_parsing() {
        let s = Submission::from_json(r#"{"name":"Li","email":null,"message":"Hi"}"#).unwrap();
        assert_eq!(s.validate().unwrap_err().fields(), vec!["email"]);
    }

    #[test]
    fn from_json_rejects_garbage() {
        assert!(matches!(
            Submission::from_json("name=Li"),
            Err(ContactError::InvalidBody(_))
        ));
    }

    // =========================================================================
    // Handling
    // =========================================================================

    #[test]
    fn without_dispatcher_submission_is_recorded() {
        let handler = handler_with(None);
        assert!(!handler.can_deliver());
        assert_eq!(handler.handle(&li()).unwrap(), Acknowledgement::Recorded);
    }

    #[test]
    fn without_dispatcher_invalid_submission_still_fails() {
        let handler = handler_with(None);
        let s = Submission {
            email: None,
            ..li()
        };
        assert!(matches!(handler.handle(&s), Err(ContactError::Validation(_))));
    }

    #[test]
    fn dispatcher_receives_composed_notification() {
        let recorder = RecordingDispatcher::default();
        let handler = handler_with(Some(Box::new(recorder.clone())));

        let ack = handler.handle(&li().with_visa_type("Tourist Visa")).unwrap();
        assert_eq!(ack, Acknowledgement::Sent);

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let n = &sent[0];
        assert_eq!(n.to, "info@jingtongvisa.com");
        assert_eq!(n.reply_to, "li@example.com");
        assert_eq!(n.subject, "Contact Form \u{2014} Tourist Visa from Li");
        assert!(n.html.contains("Hello, I need a visa."));
    }

    #[test]
    fn dispatcher_not_called_for_invalid_submission() {
        let recorder = RecordingDispatcher::default();
        let handler = handler_with(Some(Box::new(recorder.clone())));
        let _ = handler.handle(&Submission::default());
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn dispatch_failure_is_generic_delivery_error() {
        let handler = handler_with(Some(Box::new(FailingDispatcher)));
        let err = handler.handle(&li()).unwrap_err();
        assert!(matches!(err, ContactError::Delivery(_)));
        assert_eq!(err.to_string(), "failed to send message");
        assert!(!err.to_string().contains("credentials"));
    }

    // =========================================================================
    // Composition
    // =========================================================================

    #[test]
    fn subject_defaults_to_general_inquiry() {
        let n = handler_with(None).compose(&li());
        assert_eq!(n.subject, "Contact Form \u{2014} General Inquiry from Li");
    }

    #[test]
    fn missing_optionals_are_labelled() {
        let n = handler_with(None).compose(&li().with_wechat("li_wx"));
        assert!(n.html.contains("li_wx"));
        assert!(n.html.contains("Not provided"));
        assert!(n.html.contains("Not specified"));
    }

    #[test]
    fn user_input_is_escaped() {
        let s = Submission::new("<b>Li</b>", "li@example.com", "<script>alert(1)</script>");
        let n = handler_with(None).compose(&s);
        assert!(!n.html.contains("<script>"));
        assert!(n.html.contains("&lt;script&gt;"));
        assert!(n.html.contains("&lt;b&gt;Li&lt;/b&gt;"));
    }

    #[test]
    fn values_are_trimmed() {
        let s = Submission::new("  Li  ", " li@example.com ", "Hi").with_phone("  ");
        let n = handler_with(None).compose(&s);
        assert_eq!(n.reply_to, "li@example.com");
        assert!(n.subject.ends_with("from Li"));
        assert!(n.html.contains("Not provided"));
    }

    // =========================================================================
    // Response mapping
    // =========================================================================

    #[test]
    fn response_for_success() {
        let r = ContactResponse::from_result(&Ok(Acknowledgement::Recorded));
        assert_eq!(r.status, 200);
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"success":true}"#);
    }

    #[test]
    fn response_for_validation_lists_fields() {
        let result = handler_with(None).handle(&Submission {
            email: None,
            ..li()
        });
        let r = ContactResponse::from_result(&result);
        assert_eq!(r.status, 400);
        assert_eq!(r.fields, vec!["email"]);
        let json: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(json["error"], "Missing required fields");
    }

    #[test]
    fn response_for_malformed_email_says_invalid() {
        let result = handler_with(None).handle(&Submission::new("Li", "not-an-email", "Hi"));
        let r = ContactResponse::from_result(&result);
        assert_eq!(r.status, 400);
        assert_eq!(r.error.as_deref(), Some("Invalid fields"));
        assert_eq!(r.fields, vec!["email"]);
    }

    #[test]
    fn response_for_delivery_failure_hides_detail() {
        let result = handler_with(Some(Box::new(FailingDispatcher))).handle(&li());
        let r = ContactResponse::from_result(&result);
        assert_eq!(r.status, 500);
        assert_eq!(r.error.as_deref(), Some("Failed to send message"));
    }

    #[test]
    fn smtp_dispatcher_builds_without_connecting() {
        let config = ContactConfig::default();
        assert!(SmtpDispatcher::new(&config, "re_test".to_string()).is_ok());

        let starttls = ContactConfig {
            smtp_port: 587,
            ..ContactConfig::default()
        };
        assert!(SmtpDispatcher::new(&starttls, "re_test".to_string()).is_ok());
    }
}
