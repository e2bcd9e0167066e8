//! Runtime validation and coercion of externally supplied parameters.
//!
//! Before a plan executes, every declared parameter is checked against the
//! value supplied for it: multiplicity first, then a per-type coercion that
//! either normalizes the value or produces the canonical error message.
//! Validation walks parameters in declaration order and aborts on the first
//! failure; successfully coerced values replace the originals in the state.
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use pure_grammar::protocol::value::{Multiplicity, Variable};
use pure_grammar::{EngineError, EngineResult};

use crate::dates::{self, DateFormat, Temporal};
use crate::raw::RawValue;
use crate::result::ExecutionState;

/// Validate `parameters` then `extra_parameters` against the values held in
/// `state`, coercing in place. The first invalid parameter aborts the run.
pub fn validate(
    parameters: &[Variable],
    extra_parameters: &[Variable],
    state: &mut ExecutionState,
) -> EngineResult<()> {
    for parameter in parameters.iter().chain(extra_parameters.iter()) {
        validate_parameter(parameter, state)?;
    }
    Ok(())
}

fn validate_parameter(parameter: &Variable, state: &mut ExecutionState) -> EngineResult<()> {
    let Some(type_name) = parameter.class.as_deref() else {
        return Ok(());
    };
    let multiplicity = parameter
        .multiplicity
        .clone()
        .unwrap_or_else(Multiplicity::one);
    let supplied = state
        .result(&parameter.name)
        .map(|result| result.value.clone())
        .unwrap_or(RawValue::Null);

    let coerced = if is_to_many(&multiplicity) {
        coerce_to_many(type_name, &supplied, state)?
    } else {
        coerce_to_one(parameter, type_name, &supplied, &multiplicity, state)?
    };
    debug!(
        "parameter '{}' validated as {}[{}]",
        parameter.name,
        type_name,
        render_multiplicity(&multiplicity)
    );
    state.replace(&parameter.name, coerced);
    Ok(())
}

fn is_to_many(multiplicity: &Multiplicity) -> bool {
    multiplicity.upper_bound.map_or(true, |upper| upper > 1)
}

fn coerce_to_one(
    parameter: &Variable,
    type_name: &str,
    value: &RawValue,
    multiplicity: &Multiplicity,
    state: &ExecutionState,
) -> EngineResult<RawValue> {
    if value.is_null() {
        if multiplicity.lower_bound >= 1 {
            return Err(EngineError::execution(format!(
                "Missing external parameter(s): {}:{}[{}]",
                parameter.name,
                type_name,
                render_multiplicity(multiplicity)
            )));
        }
        return Ok(RawValue::Null);
    }
    if matches!(value, RawValue::List(_)) {
        return Err(invalid(unable_to_process(type_name, value)));
    }
    coerce_scalar(type_name, value, state).map_err(invalid)
}

fn coerce_to_many(
    type_name: &str,
    value: &RawValue,
    state: &ExecutionState,
) -> EngineResult<RawValue> {
    match value {
        RawValue::Null => Ok(RawValue::List(Vec::new())),
        RawValue::List(values) => {
            let mut coerced = Vec::with_capacity(values.len());
            for element in values {
                coerced.push(coerce_scalar(type_name, element, state).map_err(invalid)?);
            }
            Ok(RawValue::List(coerced))
        }
        scalar => Err(invalid(unable_to_process(type_name, scalar))),
    }
}

/// Coerce one scalar to `type_name`, or produce the bracketed detail of the
/// failure message. Class-typed parameters without a registered enumeration
/// pass through untouched.
fn coerce_scalar(
    type_name: &str,
    value: &RawValue,
    state: &ExecutionState,
) -> Result<RawValue, String> {
    if let Some(values) = state.enumeration(type_name) {
        return match value {
            RawValue::String(text) if values.iter().any(|candidate| candidate == text) => {
                Ok(value.clone())
            }
            other => Err(format!(
                "Invalid enum value {} for {}, valid enum values: [{}]",
                other,
                type_name,
                values.join(", ")
            )),
        };
    }
    match type_name {
        "String" => match value {
            RawValue::String(_) => Ok(value.clone()),
            _ => Err(unable_to_process(type_name, value)),
        },
        "Boolean" => match value {
            RawValue::Boolean(_) => Ok(value.clone()),
            RawValue::String(text) if text == "true" => Ok(RawValue::Boolean(true)),
            RawValue::String(text) if text == "false" => Ok(RawValue::Boolean(false)),
            _ => Err(unable_to_process(type_name, value)),
        },
        "Integer" => match value {
            RawValue::Integer(_) => Ok(value.clone()),
            RawValue::String(text) => text
                .parse::<i64>()
                .map(RawValue::Integer)
                .map_err(|_| unable_to_process(type_name, value)),
            _ => Err(unable_to_process(type_name, value)),
        },
        "Float" => match value {
            RawValue::Float(_) => Ok(value.clone()),
            RawValue::Integer(number) => Ok(RawValue::Float(*number as f64)),
            RawValue::Decimal(number) => number
                .to_f64()
                .map(RawValue::Float)
                .ok_or_else(|| unable_to_process(type_name, value)),
            RawValue::String(text) => text
                .parse::<f64>()
                .map(RawValue::Float)
                .map_err(|_| unable_to_process(type_name, value)),
            _ => Err(unable_to_process(type_name, value)),
        },
        "Decimal" => match value {
            RawValue::Decimal(_) => Ok(value.clone()),
            RawValue::Integer(number) => Ok(RawValue::Decimal(Decimal::from(*number))),
            RawValue::Float(number) => Decimal::from_f64_retain(*number)
                .map(RawValue::Decimal)
                .ok_or_else(|| unable_to_process(type_name, value)),
            RawValue::String(text) => text
                .parse::<Decimal>()
                .map(RawValue::Decimal)
                .map_err(|_| unable_to_process(type_name, value)),
            _ => Err(unable_to_process(type_name, value)),
        },
        "Date" | "DateTime" | "StrictDate" => coerce_temporal(type_name, value),
        _ => Ok(value.clone()),
    }
}

fn coerce_temporal(type_name: &str, value: &RawValue) -> Result<RawValue, String> {
    if let RawValue::String(text) = value {
        return match dates::parse_with(temporal_formats(type_name), text) {
            Some(Temporal::Date(date)) => Ok(RawValue::Date(date)),
            Some(Temporal::DateTime(date_time)) => Ok(RawValue::LocalDateTime(date_time)),
            Some(Temporal::Instant(instant)) => Ok(RawValue::Instant(instant)),
            None => Err(unable_to_process(type_name, value)),
        };
    }
    let accepted = match type_name {
        // StrictDate carries no time component, not even midnight.
        "StrictDate" => matches!(value, RawValue::Date(_)),
        "DateTime" => matches!(value, RawValue::LocalDateTime(_) | RawValue::Instant(_)),
        _ => matches!(
            value,
            RawValue::Date(_) | RawValue::LocalDateTime(_) | RawValue::Instant(_)
        ),
    };
    if accepted {
        Ok(value.clone())
    } else {
        Err(unable_to_process(type_name, value))
    }
}

fn temporal_formats(type_name: &str) -> &'static [DateFormat] {
    match type_name {
        "DateTime" => dates::date_time_formats(),
        "StrictDate" => dates::strict_date_formats(),
        _ => dates::date_formats(),
    }
}

fn invalid(detail: String) -> EngineError {
    EngineError::execution(format!("Invalid provided parameter(s): [{}]", detail))
}

fn unable_to_process(type_name: &str, value: &RawValue) -> String {
    let parsable = if matches!(value, RawValue::String(_)) && type_name != "String" {
        " is not parsable"
    } else {
        ""
    };
    let formats = match type_name {
        "Date" | "DateTime" | "StrictDate" => format!(
            " Expected formats: [{}]",
            dates::labels(temporal_formats(type_name))
        ),
        _ => String::new(),
    };
    format!(
        "Unable to process '{}' parameter, value: {}{}.{}",
        type_name,
        render(value),
        parsable,
        formats
    )
}

/// Error-message rendering: string inputs are single-quoted so the reader can
/// tell `5` from `'5'`.
fn render(value: &RawValue) -> String {
    match value {
        RawValue::String(text) => format!("'{}'", text),
        RawValue::List(values) => format!(
            "[{}]",
            values.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}

fn render_multiplicity(multiplicity: &Multiplicity) -> String {
    match multiplicity.upper_bound {
        Some(upper) if upper == multiplicity.lower_bound => format!("{}", upper),
        Some(upper) => format!("{}..{}", multiplicity.lower_bound, upper),
        None => format!("{}..*", multiplicity.lower_bound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ConstantResult;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn variable(name: &str, type_name: &str, multiplicity: Multiplicity) -> Variable {
        Variable {
            name: name.to_string(),
            class: Some(type_name.to_string()),
            multiplicity: Some(multiplicity),
            source_information: None,
        }
    }

    fn state_with(name: &str, value: RawValue) -> ExecutionState {
        let mut state = ExecutionState::new();
        state.add_result(name, ConstantResult::new(value));
        state
    }

    fn coerced(state: &ExecutionState, name: &str) -> RawValue {
        state.result(name).map(|r| r.value.clone()).unwrap()
    }

    #[test]
    fn test_string_rejects_integer_with_exact_message() {
        let mut state = state_with("input", RawValue::Integer(5));
        let err = validate(
            &[variable("input", "String", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "Invalid provided parameter(s): [Unable to process 'String' parameter, value: 5.]"
        );
    }

    #[test]
    fn test_strict_date_rejects_date_time_string_with_formats() {
        let mut state = state_with(
            "d",
            RawValue::String("2020-07-14 15:18:23".to_string()),
        );
        let err = validate(
            &[variable("d", "StrictDate", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "Invalid provided parameter(s): [Unable to process 'StrictDate' parameter, \
             value: '2020-07-14 15:18:23' is not parsable. Expected formats: [yyyy-MM-dd]]"
        );
    }

    #[test]
    fn test_date_time_with_zone_is_normalized_to_utc() {
        let mut state = state_with(
            "d",
            RawValue::String("2020-07-14T15:18:23-0300".to_string()),
        );
        validate(
            &[variable("d", "DateTime", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap();
        let expected = Utc.with_ymd_and_hms(2020, 7, 14, 18, 18, 23).unwrap();
        assert_eq!(coerced(&state, "d"), RawValue::Instant(expected));
    }

    #[test]
    fn test_date_time_rejects_bare_date_string() {
        let mut state = state_with("d", RawValue::String("2020-07-14".to_string()));
        let err = validate(
            &[variable("d", "DateTime", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert!(err.message.starts_with(
            "Invalid provided parameter(s): [Unable to process 'DateTime' parameter, value: "
        ));
    }

    #[test]
    fn test_strict_date_rejects_midnight_instant() {
        let midnight = Utc.with_ymd_and_hms(2020, 7, 14, 0, 0, 0).unwrap();
        let mut state = state_with("d", RawValue::Instant(midnight));
        let err = validate(
            &[variable("d", "StrictDate", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert!(err.message.starts_with(
            "Invalid provided parameter(s): [Unable to process 'StrictDate' parameter, value: "
        ));
    }

    #[test]
    fn test_strict_date_accepts_calendar_date() {
        let mut state = state_with("d", RawValue::String("2020-07-14".to_string()));
        validate(
            &[variable("d", "StrictDate", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(
            coerced(&state, "d"),
            RawValue::Date(NaiveDate::from_ymd_opt(2020, 7, 14).unwrap())
        );
    }

    #[test]
    fn test_missing_required_parameter() {
        let mut state = ExecutionState::new();
        let err = validate(
            &[variable("input", "String", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(err.message, "Missing external parameter(s): input:String[1]");
    }

    #[test]
    fn test_optional_parameter_accepts_null() {
        let mut state = state_with("input", RawValue::Null);
        validate(
            &[variable("input", "String", Multiplicity::zero_one())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(coerced(&state, "input"), RawValue::Null);
    }

    #[test]
    fn test_integer_extremes_survive_coercion() {
        for value in [i64::MAX, i64::MIN] {
            let mut state = state_with("n", RawValue::Integer(value));
            validate(
                &[variable("n", "Integer", Multiplicity::one())],
                &[],
                &mut state,
            )
            .unwrap();
            assert_eq!(coerced(&state, "n"), RawValue::Integer(value));

            let mut state = state_with("n", RawValue::String(value.to_string()));
            validate(
                &[variable("n", "Integer", Multiplicity::one())],
                &[],
                &mut state,
            )
            .unwrap();
            assert_eq!(coerced(&state, "n"), RawValue::Integer(value));
        }
    }

    #[test]
    fn test_integer_rejects_float_value() {
        let mut state = state_with("n", RawValue::Float(1.5));
        let err = validate(
            &[variable("n", "Integer", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "Invalid provided parameter(s): [Unable to process 'Integer' parameter, value: 1.5.]"
        );
    }

    #[test]
    fn test_float_widens_integer() {
        let mut state = state_with("f", RawValue::Integer(3));
        validate(
            &[variable("f", "Float", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(coerced(&state, "f"), RawValue::Float(3.0));
    }

    #[test]
    fn test_boolean_accepts_exact_literals_only() {
        let mut state = state_with("b", RawValue::String("true".to_string()));
        validate(
            &[variable("b", "Boolean", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(coerced(&state, "b"), RawValue::Boolean(true));

        let mut state = state_with("b", RawValue::String("True".to_string()));
        assert!(validate(
            &[variable("b", "Boolean", Multiplicity::one())],
            &[],
            &mut state,
        )
        .is_err());
    }

    #[test]
    fn test_decimal_from_string() {
        let mut state = state_with("d", RawValue::String("3.14".to_string()));
        validate(
            &[variable("d", "Decimal", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(
            coerced(&state, "d"),
            RawValue::Decimal("3.14".parse().unwrap())
        );
    }

    #[test]
    fn test_to_many_preserves_order_and_length() {
        let mut state = state_with(
            "ns",
            RawValue::List(vec![
                RawValue::Integer(3),
                RawValue::String("1".to_string()),
                RawValue::Integer(2),
            ]),
        );
        validate(
            &[variable("ns", "Integer", Multiplicity::zero_many())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(
            coerced(&state, "ns"),
            RawValue::List(vec![
                RawValue::Integer(3),
                RawValue::Integer(1),
                RawValue::Integer(2),
            ])
        );
    }

    #[test]
    fn test_to_many_null_becomes_empty_list() {
        let mut state = state_with("ns", RawValue::Null);
        validate(
            &[variable("ns", "Integer", Multiplicity::zero_many())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(coerced(&state, "ns"), RawValue::List(Vec::new()));
    }

    #[test]
    fn test_to_many_fails_on_first_bad_element() {
        let mut state = state_with(
            "ns",
            RawValue::List(vec![
                RawValue::Integer(1),
                RawValue::String("x".to_string()),
            ]),
        );
        let err = validate(
            &[variable("ns", "Integer", Multiplicity::zero_many())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert!(err.message.starts_with(
            "Invalid provided parameter(s): [Unable to process 'Integer' parameter, value: "
        ));
    }

    #[test]
    fn test_scalar_rejected_where_sequence_expected() {
        let mut state = state_with("ns", RawValue::Integer(1));
        let err = validate(
            &[variable("ns", "Integer", Multiplicity::zero_many())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert!(err.message.starts_with(
            "Invalid provided parameter(s): [Unable to process 'Integer' parameter, value: "
        ));
    }

    #[test]
    fn test_sequence_rejected_where_scalar_expected() {
        let mut state = state_with(
            "n",
            RawValue::List(vec![RawValue::Integer(1), RawValue::Integer(2)]),
        );
        let err = validate(
            &[variable("n", "Integer", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert!(err.message.starts_with(
            "Invalid provided parameter(s): [Unable to process 'Integer' parameter, value: "
        ));
    }

    #[test]
    fn test_enum_value_checked_against_registered_enumeration() {
        let mut state = state_with("et", RawValue::String("CONTRCT".to_string()));
        state.register_enumeration(
            "test::EmployeeType",
            vec!["CONTRACT".to_string(), "FULL_TIME".to_string()],
        );
        let err = validate(
            &[variable("et", "test::EmployeeType", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "Invalid provided parameter(s): [Invalid enum value CONTRCT for test::EmployeeType, \
             valid enum values: [CONTRACT, FULL_TIME]]"
        );

        let mut state = state_with("et", RawValue::String("CONTRACT".to_string()));
        state.register_enumeration(
            "test::EmployeeType",
            vec!["CONTRACT".to_string(), "FULL_TIME".to_string()],
        );
        validate(
            &[variable("et", "test::EmployeeType", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap();
    }

    #[test]
    fn test_first_failure_aborts_in_declaration_order() {
        let mut state = state_with("a", RawValue::Integer(5));
        state.add_result("b", ConstantResult::new(RawValue::Integer(7)));
        let err = validate(
            &[
                variable("a", "String", Multiplicity::one()),
                variable("b", "String", Multiplicity::one()),
            ],
            &[],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "Invalid provided parameter(s): [Unable to process 'String' parameter, value: 5.]"
        );
        // the second parameter was never touched
        assert_eq!(coerced(&state, "b"), RawValue::Integer(7));
    }

    #[test]
    fn test_extra_parameters_validated_after_declared_ones() {
        let mut state = state_with("a", RawValue::String("ok".to_string()));
        state.add_result("extra", ConstantResult::new(RawValue::Integer(9)));
        let err = validate(
            &[variable("a", "String", Multiplicity::one())],
            &[variable("extra", "String", Multiplicity::one())],
            &mut state,
        )
        .unwrap_err();
        assert_eq!(
            err.message,
            "Invalid provided parameter(s): [Unable to process 'String' parameter, value: 9.]"
        );
    }

    #[test]
    fn test_class_typed_parameter_passes_through() {
        let mut state = state_with("p", RawValue::String("anything".to_string()));
        validate(
            &[variable("p", "my::Class", Multiplicity::one())],
            &[],
            &mut state,
        )
        .unwrap();
        assert_eq!(
            coerced(&state, "p"),
            RawValue::String("anything".to_string())
        );
    }
}
