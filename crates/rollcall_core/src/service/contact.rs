//! WhatsApp outreach links for absent participants.

use crate::model::context::Context;
use crate::model::participant::Participant;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D+").expect("valid digit regex"));

const WHATSAPP_BASE: &str = "https://wa.me/";

#[derive(Debug)]
pub enum ContactError {
    /// No usable digits in the phone number.
    MissingPhone,
    InvalidUrl(url::ParseError),
}

impl Display for ContactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPhone => write!(f, "no phone number to contact"),
            Self::InvalidUrl(err) => write!(f, "invalid contact url: {err}"),
        }
    }
}

impl Error for ContactError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUrl(err) => Some(err),
            Self::MissingPhone => None,
        }
    }
}

impl From<url::ParseError> for ContactError {
    fn from(value: url::ParseError) -> Self {
        Self::InvalidUrl(value)
    }
}

/// Digits-only international number; `None` when nothing is left.
///
/// The country code is prepended unless the digits already start with it.
pub fn normalize_phone(raw: &str, country_code: &str) -> Option<String> {
    let digits = NON_DIGIT_RE.replace_all(raw, "");
    if digits.is_empty() {
        return None;
    }
    let country_code = NON_DIGIT_RE.replace_all(country_code, "");
    if digits.starts_with(&*country_code) {
        Some(digits.into_owned())
    } else {
        Some(format!("{country_code}{digits}"))
    }
}

/// Message sent to whoever answers for the participant.
pub fn outreach_message(participant_name: &str, context: Context) -> String {
    let name = participant_name.trim();
    match context {
        Context::Ministry => format!(
            "Oi! Como você está?\n\nSentimos falta do(a) {name} na aula do Ministério Infantil! \
             Esperamos que estejam todos bem. Quando puderem, venham nos visitar!\n\n\
             Um grande abraço e que Deus os abençoe!"
        ),
        Context::Reception => format!(
            "Oi, {name}! Como você está?\n\nSentimos sua falta nos nossos encontros. \
             Esperamos que esteja tudo bem! Quando puder, venha nos visitar.\n\n\
             Um grande abraço e que Deus te abençoe!"
        ),
    }
}

/// `https://wa.me/<digits>?text=<message>` for the given phone.
pub fn whatsapp_link(
    phone: &str,
    participant_name: &str,
    context: Context,
    country_code: &str,
) -> Result<Url, ContactError> {
    let number = normalize_phone(phone, country_code).ok_or(ContactError::MissingPhone)?;
    let message = outreach_message(participant_name, context);
    let url = Url::parse_with_params(
        &format!("{WHATSAPP_BASE}{number}"),
        [("text", message.as_str())],
    )?;
    Ok(url)
}

/// Link for a roster participant, using their contact phone.
pub fn whatsapp_link_for(
    participant: &Participant,
    country_code: &str,
) -> Result<Url, ContactError> {
    let phone = participant
        .contact_phone()
        .ok_or(ContactError::MissingPhone)?;
    whatsapp_link(phone, participant.name(), participant.context(), country_code)
}
