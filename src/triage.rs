//! Rule-based detection of vague "help, nothing works" requests.
//!
//! Such messages carry no topic to retrieve against, so they go straight to a
//! human operator with a prompt for details. A request is generic when it
//! matches at least one [`GenericRule`] and no [`TopicHint`]; the presence of
//! a concrete topic ("password", "payment", ...) keeps it on the retrieval path.

use regex::Regex;
use std::sync::LazyLock;

/// Phrases that signal a vague or panicked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericRule {
    PleaseHelp,
    Urgent,
    Problem,
    NotWorking,
    Broken,
    Error,
}

/// Subjects that make a request specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicHint {
    Password,
    Subscription,
    Tariff,
    Payment,
    Receipt,
    Email,
    SignIn,
    TwoFactor,
    Upload,
    ApiKey,
    Team,
}

impl GenericRule {
    pub const ALL: [GenericRule; 6] = [
        GenericRule::PleaseHelp,
        GenericRule::Urgent,
        GenericRule::Problem,
        GenericRule::NotWorking,
        GenericRule::Broken,
        GenericRule::Error,
    ];

    /// Short reason shown to the user.
    pub fn describe(self) -> &'static str {
        match self {
            GenericRule::PleaseHelp => "a call for help",
            GenericRule::Urgent => "marked as urgent",
            GenericRule::Problem => "reports a problem",
            GenericRule::NotWorking => "says something does not work",
            GenericRule::Broken => "says something is broken",
            GenericRule::Error => "mentions an error",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            GenericRule::PleaseHelp => r"помог(ите|и)?|help",
            GenericRule::Urgent => r"срочно|urgent(ly)?|asap",
            GenericRule::Problem => r"проблем(а|ы)|problems?|issues?",
            GenericRule::NotWorking => {
                r"(ничего )?не работает|(nothing|does ?n[o']t|is ?n[o']t|not) work(s|ing)?"
            }
            GenericRule::Broken => r"сломал(ось|ся)|broken|broke",
            GenericRule::Error => r"ошибк(а|и)|errors?",
        }
    }
}

impl TopicHint {
    pub const ALL: [TopicHint; 11] = [
        TopicHint::Password,
        TopicHint::Subscription,
        TopicHint::Tariff,
        TopicHint::Payment,
        TopicHint::Receipt,
        TopicHint::Email,
        TopicHint::SignIn,
        TopicHint::TwoFactor,
        TopicHint::Upload,
        TopicHint::ApiKey,
        TopicHint::Team,
    ];

    fn pattern(self) -> &'static str {
        match self {
            TopicHint::Password => r"парол(ь|я)|password",
            TopicHint::Subscription => r"подписк(а|у|и)|subscription",
            TopicHint::Tariff => r"тариф(ы|а)?|plans?|pricing",
            TopicHint::Payment => r"плат(еж|ёж)\w*|оплат\w*|payments?|pay|billing",
            TopicHint::Receipt => r"чек|сч(е|ё)т|receipts?|invoices?",
            TopicHint::Email => r"email|почт\w*|e-mail",
            TopicHint::SignIn => r"вход\w*|войти|авториз\w*|логин\w*|log ?in|sign ?in|login",
            TopicHint::TwoFactor => r"2fa|двухфактор\w*|two-factor",
            TopicHint::Upload => r"файл\w*|загруз\w*|files?|uploads?",
            TopicHint::ApiKey => r"api|ключ|keys?|tokens?",
            TopicHint::Team => r"команд(а|у)|пользовател\w*|team|users?",
        }
    }
}

/// Case-insensitive, word-bounded alternation of all patterns.
fn compile(patterns: impl Iterator<Item = &'static str>) -> Regex {
    let body = patterns.collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"(?i)\b({body})\b")).expect("static triage pattern")
}

static SPECIFIC: LazyLock<Regex> =
    LazyLock::new(|| compile(TopicHint::ALL.iter().map(|h| h.pattern())));

static GENERIC: LazyLock<Vec<(GenericRule, Regex)>> = LazyLock::new(|| {
    GenericRule::ALL
        .iter()
        .map(|rule| (*rule, compile(std::iter::once(rule.pattern()))))
        .collect()
});

/// The first generic rule `text` matches, unless it also names a topic.
pub fn generic_rule(text: &str) -> Option<GenericRule> {
    if SPECIFIC.is_match(text) {
        return None;
    }
    GENERIC
        .iter()
        .find(|(_, re)| re.is_match(text))
        .map(|(rule, _)| *rule)
}
