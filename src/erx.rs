/// Fault: typed view over the layouted codes raised here
/// ResultE<T> = Result<T, Erx>;
/// ResultEX = ResultE<()>;
/// fn smp<T: ToString>(error: T) -> Erx
/// fn amp<T: ToString>(additional: &str) -> impl Fn(T) -> Erx
/// fn emp<T: std::error::Error>(error: T) -> Erx
use crate::conf;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

lazy_static! {
    static ref APP_SHORT: String = match conf::current().read() {
        Ok(setting) => setting.short.clone(),
        Err(_) => conf::Setting::default().short,
    };
}

/// ResultE<T> = Result<T, Erx>;
pub type ResultE<T> = Result<T, Erx>;

/// ResultEX = ResultE<()>;
pub type ResultEX = ResultE<()>;

pub fn describe_error(e: &dyn std::error::Error) -> String {
    let mut description = e.to_string();
    let mut current = e.source();
    while let Some(source) = current {
        description.push_str(&format!("\nCaused by: {}", source));
        current = source.source();
    }
    description
}

/// emp: convert a std error to a remote failure, keeping the whole cause chain in `ORIGIN`
pub fn emp<T: std::error::Error>(error: T) -> Erx {
    let extra = vec![(String::from("ORIGIN"), describe_error(&error))];
    let message = error.to_string();
    Erx { code: Fault::RemoteFailure.code(), message, extra }
}

/// smp: simple convert T: ToString to Erx
pub fn smp<T: ToString>(error: T) -> Erx {
    Erx { code: Default::default(), message: error.to_string(), extra: Vec::new() }
}

/// amp: return a function that convert T: ToString to Erx, prefixed with `additional`
///
/// # Example
/// ```
/// use ringsdata::erx::amp;
/// let erx = amp("decode failed")("unexpected end of input");
/// assert_eq!(erx.message(), "decode failed : unexpected end of input");
/// ```
pub fn amp<T: ToString>(additional: &str) -> impl Fn(T) -> Erx {
    let additional = additional.to_string();
    move |err: T| Erx { code: Default::default(), message: format!("{} : {}", additional, err.to_string()), extra: Vec::new() }
}

/// Predefined Layouted domain code with length 4
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum PreL4 {
    /// Key rules of the custom data bag
    KEYS,
    /// Attribute surface
    ATTR,
    /// Reconciliation with the remote store
    SYNC,
    /// Remote store
    REMO,
    /// Undefined
    UNDF,
}

impl PreL4 {
    pub fn four(&self) -> &'static str {
        match self {
            PreL4::KEYS => "KEYS",
            PreL4::ATTR => "ATTR",
            PreL4::SYNC => "SYNC",
            PreL4::REMO => "REMO",
            PreL4::UNDF => "UNDF",
        }
    }

    pub fn layoutc(&self, category: &str, detail: &str) -> LayoutedC {
        LayoutedC::new(self.four(), category, detail)
    }
}

impl Display for PreL4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.four())
    }
}

impl From<PreL4> for String {
    fn from(value: PreL4) -> Self {
        value.four().to_string()
    }
}

/// Typed view over the layouted codes this crate raises.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Fault {
    /// caller attempted to set a protected key
    NotWritable,
    /// caller attempted to delete a protected timestamp key
    NotDeletable,
    /// caller used a key starting with the reserved prefix
    InvalidKey,
    /// key absent from the materialized bag
    MissingKey,
    /// attribute outside the protected schema
    NoAttribute,
    /// upsert requested for a resource that has no href yet
    Detached,
    /// server payload could not be interpreted
    Malformed,
    /// any remote store failure other than a tolerated not-found delete
    RemoteFailure,
    Undefined,
}

impl Fault {
    fn parts(&self) -> (PreL4, &'static str, &'static str) {
        match self {
            Fault::NotWritable => (PreL4::KEYS, "WRIT", "NWRT"),
            Fault::NotDeletable => (PreL4::KEYS, "DELE", "NDEL"),
            Fault::InvalidKey => (PreL4::KEYS, "NAME", "IKEY"),
            Fault::MissingKey => (PreL4::KEYS, "READ", "MKEY"),
            Fault::NoAttribute => (PreL4::ATTR, "READ", "NATR"),
            Fault::Detached => (PreL4::SYNC, "SAVE", "DTCH"),
            Fault::Malformed => (PreL4::REMO, "DECO", "MALF"),
            Fault::RemoteFailure => (PreL4::REMO, "CALL", "RMTE"),
            Fault::Undefined => (PreL4::UNDF, "UNDF", "UNDF"),
        }
    }

    pub fn code(&self) -> LayoutedC {
        let (domain, category, detail) = self.parts();
        domain.layoutc(category, detail)
    }

    pub fn from_code(code: &LayoutedC) -> Fault {
        [
            Fault::NotWritable,
            Fault::NotDeletable,
            Fault::InvalidKey,
            Fault::MissingKey,
            Fault::NoAttribute,
            Fault::Detached,
            Fault::Malformed,
            Fault::RemoteFailure,
        ]
        .into_iter()
        .find(|fault| {
            let (domain, category, detail) = fault.parts();
            code.domain == domain.four() && code.category == category && code.detail == detail
        })
        .unwrap_or(Fault::Undefined)
    }
}

/// Code code format
/// aaaa-xxxx-yyyy-zzzz
///
///    aaaa : application short name
///    xxxx : domain
///    yyyy : category inside the domain
///    zzzz : concrete error
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LayoutedC {
    pub application: String,
    pub domain: String,
    pub category: String,
    pub detail: String,
}

impl LayoutedC {
    pub fn new(domain: &str, category: &str, detail: &str) -> LayoutedC {
        LayoutedC { application: APP_SHORT.clone(), domain: domain.into(), category: category.into(), detail: detail.into() }
    }

    pub fn layout_string(&self) -> String {
        format!("{}-{}-{}-{}", self.application, self.domain, self.category, self.detail)
    }
}

impl Default for LayoutedC {
    fn default() -> Self {
        LayoutedC { application: APP_SHORT.clone(), domain: PreL4::UNDF.into(), category: PreL4::UNDF.into(), detail: PreL4::UNDF.into() }
    }
}

impl From<LayoutedC> for String {
    fn from(value: LayoutedC) -> Self {
        value.layout_string()
    }
}

impl From<String> for LayoutedC {
    fn from(value: String) -> Self {
        let mut c = LayoutedC::default();
        let parts: Vec<&str> = value.split("-").collect();
        if let Some(application) = parts.first() {
            c.application = application.to_string();
        }
        if let Some(domain) = parts.get(1) {
            c.domain = domain.to_string();
        }
        if let Some(category) = parts.get(2) {
            c.category = category.to_string();
        }
        if let Some(detail) = parts.get(3) {
            c.detail = detail.to_string();
        }
        c
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erx {
    code: LayoutedC,
    message: String,
    extra: Vec<(String, String)>,
}

impl Erx {
    pub fn new(message: &str) -> Erx {
        Erx { code: Default::default(), message: message.to_string(), extra: Vec::new() }
    }

    /// Erx with the layouted code of `fault`
    pub fn with_fault(fault: Fault, message: &str) -> Erx {
        Erx { code: fault.code(), message: message.to_string(), extra: Vec::new() }
    }

    pub fn code(&self) -> LayoutedC {
        self.code.clone()
    }

    pub fn fault(&self) -> Fault {
        Fault::from_code(&self.code)
    }

    pub fn is(&self, fault: Fault) -> bool {
        self.fault() == fault
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn description(&self) -> String {
        let mut description = self.code.layout_string();
        description.push(' ');
        description.push_str(&self.message);
        if self.extra.is_empty() {
            return description;
        }

        description.push_str(" { ");
        let pairs: Vec<String> = self.extra.iter().map(|x| format!("{}={}", x.0, x.1)).collect();
        description.push_str(&pairs.join(", "));
        description.push_str(" }");

        description
    }

    /// get extra
    pub fn extra(&self) -> &Vec<(String, String)> {
        &self.extra
    }

    /// get extra value, if not exists, return None
    pub fn extra_val(&self, key: &str) -> Option<String> {
        self.extra.iter().find(|e| e.0.eq(key)).map(|e| e.1.clone())
    }

    /// add extra
    /// if key exists, replace value
    pub fn add_extra(&mut self, key: &str, value: &str) -> &mut Self {
        for (k, v) in self.extra.iter_mut() {
            if *k == key {
                *v = value.to_string();
                return self;
            }
        }

        self.extra.push((key.to_string(), value.to_string()));
        self
    }

    /// builder flavour of add_extra
    pub fn extra_with(mut self, key: &str, value: &str) -> Self {
        self.add_extra(key, value);
        self
    }
}

impl Display for Erx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap_or_default())
    }
}

impl std::error::Error for Erx {}

impl Default for Erx {
    fn default() -> Self {
        Erx { code: Default::default(), message: Default::default(), extra: Default::default() }
    }
}

impl From<String> for Erx {
    fn from(str: String) -> Erx {
        if str.is_empty() {
            return Erx::default();
        }

        serde_json::from_str(&str).unwrap_or_else(|_| Erx::new(&str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_round_trip_through_code() {
        let erx = Erx::with_fault(Fault::NotWritable, "Custom data property 'created_at' is not writable");
        assert_eq!(erx.fault(), Fault::NotWritable);
        assert!(erx.is(Fault::NotWritable));
        assert_eq!(erx.code().domain, "KEYS");
        assert_eq!(erx.code().detail, "NWRT");

        let parsed: LayoutedC = erx.code().layout_string().into();
        assert_eq!(Fault::from_code(&parsed), Fault::NotWritable);
    }

    #[test]
    fn test_plain_errors_are_undefined() {
        assert_eq!(smp("boom").fault(), Fault::Undefined);
        assert_eq!(Erx::new("boom").fault(), Fault::Undefined);
    }

    #[test]
    fn test_description_lists_extras() {
        let erx = Erx::with_fault(Fault::RemoteFailure, "server error").extra_with("STATUS", "500").extra_with("HREF", "/x");
        let description = erx.description();
        assert!(description.ends_with("server error { STATUS=500, HREF=/x }"), "{}", description);
        assert_eq!(erx.extra_val("STATUS").as_deref(), Some("500"));
        assert_eq!(erx.extra().len(), 2);
    }

    #[test]
    fn test_display_round_trips_through_string() {
        let erx = Erx::with_fault(Fault::MissingKey, "color");
        let back: Erx = erx.to_string().into();
        assert_eq!(back.fault(), Fault::MissingKey);
        assert_eq!(back.message(), "color");
    }

    #[test]
    fn test_emp_keeps_origin() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let erx = emp(io);
        assert_eq!(erx.fault(), Fault::RemoteFailure);
        assert_eq!(erx.extra_val("ORIGIN").as_deref(), Some("refused"));
    }
}
