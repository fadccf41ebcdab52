//! Template helpers injected into the Handlebars registry.
//!
//! Every helper reads its literal hash arguments, then either advances a
//! session-owned sequence (`sequential=true`) or makes an independent random
//! draw. A helper that cannot interpret its arguments fails the whole record.

use crate::error::GeneratorError;
use crate::generators::timestamp::{self, now, parse_date, parse_datetime};
use crate::generators::{choice, name, numeric, uuid};
use crate::generators::{SequenceNumber, SequentialNumeric, SequentialTemporal};
use crate::session::GenerationSession;
use chrono::{NaiveDateTime, TimeDelta};
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason,
};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;

pub const FAKE_INT: &str = "fake-int";
pub const FAKE_LONG: &str = "fake-long";
pub const FAKE_DOUBLE: &str = "fake-double";
pub const FAKE_DATE: &str = "fake-date";
pub const FAKE_DATETIME: &str = "fake-datetime";
pub const FAKE_UUID: &str = "fake-uuid";
pub const FAKE_FIRST_NAME: &str = "fake-firstName";
pub const FAKE_LAST_NAME: &str = "fake-lastName";
pub const FAKE_FULL_NAME: &str = "fake-fullName";
pub const ONE_OF: &str = "oneof";

/// Default output pattern for `fake-date`.
pub const DEFAULT_DATE_OUTPUT: &str = "%Y-%m-%d";

/// Default output pattern for `fake-datetime`.
pub const DEFAULT_DATETIME_OUTPUT: &str = "%Y-%m-%d %H:%M:%S%.3f";

const ARG_START: &str = "start";
const ARG_END: &str = "end";
const ARG_MIN: &str = "min";
const ARG_MAX: &str = "max";
const ARG_SEQUENTIAL: &str = "sequential";
const ARG_INCREMENT: &str = "increment";
const ARG_INTERVAL: &str = "interval";
const ARG_FORMAT: &str = "format";
const ARG_ID: &str = "id";

type HelperFn = fn(&GenerationSession, &HelperArgs<'_>) -> Result<String, GeneratorError>;

/// Register every helper on `handlebars`, bound to `session`.
pub fn register_helpers(handlebars: &mut Handlebars<'static>, session: &Arc<GenerationSession>) {
    let helpers: [(&'static str, HelperFn); 10] = [
        (FAKE_INT, |s, a| fake_number::<i32>(s, a, i32::MIN, i32::MAX)),
        (FAKE_LONG, |s, a| fake_number::<i64>(s, a, i64::MIN, i64::MAX)),
        (FAKE_DOUBLE, |s, a| fake_number::<f64>(s, a, 0.0, 1_000_000.0)),
        (FAKE_DATE, |s, a| fake_temporal(s, a, parse_date, DEFAULT_DATE_OUTPUT)),
        (FAKE_DATETIME, |s, a| {
            fake_temporal(s, a, parse_datetime, DEFAULT_DATETIME_OUTPUT)
        }),
        (FAKE_UUID, |_, _| Ok(uuid::random_uuid_v4(&mut rand::rng()).to_string())),
        (FAKE_FIRST_NAME, |_, _| Ok(name::first_name())),
        (FAKE_LAST_NAME, |_, _| Ok(name::last_name())),
        (FAKE_FULL_NAME, |_, _| Ok(name::full_name())),
        (ONE_OF, one_of),
    ];

    for (helper_name, helper) in helpers {
        let session = session.clone();
        handlebars.register_helper(
            helper_name,
            Box::new(
                move |h: &Helper,
                      _: &Handlebars,
                      _: &Context,
                      _: &mut RenderContext,
                      out: &mut dyn Output|
                      -> HelperResult {
                    let args = HelperArgs::new(helper_name, h);
                    let value = helper(&session, &args).map_err(|e| {
                        RenderError::from(RenderErrorReason::Other(e.to_string()))
                    })?;
                    out.write(&value)?;
                    Ok(())
                },
            ),
        );
    }
}

/// Numbers accepted as helper arguments.
trait ArgNumber: SequenceNumber {
    const ONE: Self;

    fn from_json(value: &JsonValue) -> Option<Self>;

    fn random(min: Self, max: Self) -> Result<Self, String>;
}

impl ArgNumber for i32 {
    const ONE: Self = 1;

    fn from_json(value: &JsonValue) -> Option<Self> {
        i64::from_json(value).and_then(|v| i32::try_from(v).ok())
    }

    fn random(min: Self, max: Self) -> Result<Self, String> {
        Ok(numeric::random_in_range(&mut rand::rng(), min, max))
    }
}

impl ArgNumber for i64 {
    const ONE: Self = 1;

    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn random(min: Self, max: Self) -> Result<Self, String> {
        Ok(numeric::random_in_range(&mut rand::rng(), min, max))
    }
}

impl ArgNumber for f64 {
    const ONE: Self = 1.0;

    fn from_json(value: &JsonValue) -> Option<Self> {
        let parsed = match value {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.filter(|v: &f64| v.is_finite())
    }

    fn random(min: Self, max: Self) -> Result<Self, String> {
        if !(max - min).is_finite() {
            return Err(format!("range [{min}, {max}] is too wide"));
        }
        Ok(numeric::random_double(&mut rand::rng(), min, max))
    }
}

fn fake_number<T: ArgNumber>(
    session: &GenerationSession,
    args: &HelperArgs<'_>,
    default_min: T,
    default_max: T,
) -> Result<String, GeneratorError> {
    let min = args.number(ARG_MIN, default_min)?;
    let max = args.number(ARG_MAX, default_max)?;
    if max < min {
        return Err(args.invalid(ARG_MAX, format!("{max} is below min {min}")));
    }

    if args.flag(ARG_SEQUENTIAL)? {
        let increment = args.number(ARG_INCREMENT, T::ONE)?;
        let value = session
            .registry()
            .next_value(&args.id(), || Ok(SequentialNumeric::new(min, max, increment)))?;
        return Ok(value.to_string());
    }

    let value = T::random(min, max).map_err(|reason| args.invalid(ARG_MAX, reason))?;
    Ok(value.to_string())
}

fn fake_temporal(
    session: &GenerationSession,
    args: &HelperArgs<'_>,
    parse: fn(&str) -> Option<NaiveDateTime>,
    default_output: &str,
) -> Result<String, GeneratorError> {
    let defaults = session.temporal_defaults();
    let start = args.timestamp(ARG_START, parse)?.or(defaults.start);
    let end = args.timestamp(ARG_END, parse)?;
    let interval = args.interval()?;
    let output = args.text(ARG_FORMAT)?.unwrap_or(default_output);

    if let (Some(start), Some(end)) = (start, end.or(defaults.end)) {
        if end < start {
            return Err(args.invalid(ARG_END, format!("{end} is before start {start}")));
        }
    }

    let start = start.unwrap_or_else(now);
    let one_hour_later = start
        .checked_add_signed(TimeDelta::hours(1))
        .unwrap_or(start);

    let value = if args.flag(ARG_SEQUENTIAL)? {
        let total = session.total_records();
        session.registry().next_value(&args.id(), || {
            match (end, interval, defaults.end, defaults.interval) {
                (Some(end), _, _, _) => SequentialTemporal::bounded(start, end, total),
                (None, Some(step), _, _) => Ok(SequentialTemporal::with_interval(start, step)),
                (None, None, Some(end), _) => SequentialTemporal::bounded(start, end, total),
                (None, None, None, Some(step)) => {
                    Ok(SequentialTemporal::with_interval(start, step))
                }
                (None, None, None, None) => SequentialTemporal::bounded(start, one_hour_later, total),
            }
        })?
    } else {
        let end = end.or(defaults.end).unwrap_or(one_hour_later);
        timestamp::random_between(&mut rand::rng(), start, end)
    };

    let mut rendered = String::new();
    write!(rendered, "{}", value.format(output))
        .map_err(|_| args.invalid(ARG_FORMAT, format!("'{output}' is not a valid pattern")))?;
    Ok(rendered)
}

fn one_of(_: &GenerationSession, args: &HelperArgs<'_>) -> Result<String, GeneratorError> {
    choice::one_of(&mut rand::rng(), &args.params)
        .map(choice::json_to_text)
        .ok_or_else(|| args.invalid("params", "needs at least one choice".to_string()))
}

/// Literal arguments passed to one helper invocation.
pub(crate) struct HelperArgs<'a> {
    helper: &'static str,
    hash: BTreeMap<&'a str, &'a JsonValue>,
    params: Vec<JsonValue>,
}

impl<'a> HelperArgs<'a> {
    fn new(helper: &'static str, h: &'a Helper) -> Self {
        Self {
            helper,
            hash: h.hash().iter().map(|(k, v)| (*k, v.value())).collect(),
            params: h.params().iter().map(|p| p.value().clone()).collect(),
        }
    }

    #[cfg(test)]
    fn from_parts(
        helper: &'static str,
        hash: BTreeMap<&'a str, &'a JsonValue>,
        params: Vec<JsonValue>,
    ) -> Self {
        Self {
            helper,
            hash,
            params,
        }
    }

    fn invalid(&self, argument: &'static str, reason: String) -> GeneratorError {
        GeneratorError::InvalidArgument {
            helper: self.helper,
            argument,
            reason,
        }
    }

    fn id(&self) -> String {
        self.hash
            .get(ARG_ID)
            .map(|value| choice::json_to_text(value))
            .unwrap_or_else(|| self.helper.to_string())
    }

    fn flag(&self, key: &'static str) -> Result<bool, GeneratorError> {
        match self.hash.get(key) {
            None | Some(JsonValue::Null) => Ok(false),
            Some(JsonValue::Bool(b)) => Ok(*b),
            Some(JsonValue::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| self.invalid(key, format!("'{s}' is not a boolean"))),
            Some(other) => Err(self.invalid(key, format!("{other} is not a boolean"))),
        }
    }

    fn number<T: ArgNumber>(&self, key: &'static str, default: T) -> Result<T, GeneratorError> {
        match self.hash.get(key) {
            None => Ok(default),
            Some(value) => T::from_json(value)
                .ok_or_else(|| self.invalid(key, format!("{value} is not a valid {}", T::KIND))),
        }
    }

    fn text(&self, key: &'static str) -> Result<Option<&'a str>, GeneratorError> {
        match self.hash.get(key) {
            None => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.invalid(key, format!("{other} is not a string"))),
        }
    }

    fn timestamp(
        &self,
        key: &'static str,
        parse: fn(&str) -> Option<NaiveDateTime>,
    ) -> Result<Option<NaiveDateTime>, GeneratorError> {
        match self.text(key)? {
            None => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| self.invalid(key, format!("cannot parse '{s}'"))),
        }
    }

    fn interval(&self) -> Result<Option<TimeDelta>, GeneratorError> {
        if !self.hash.contains_key(ARG_INTERVAL) {
            return Ok(None);
        }
        let seconds: f64 = self.number(ARG_INTERVAL, 0.0)?;
        if seconds < 0.0 {
            return Err(self.invalid(ARG_INTERVAL, "must not be negative".to_string()));
        }
        Ok(Some(TimeDelta::milliseconds((seconds * 1000.0).round() as i64)))
    }
}
