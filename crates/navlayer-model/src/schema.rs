//! Table-driven layer validation
//!
//! Every layer structure is described by a static [`Structure`]: a table of
//! [`FieldRule`]s mapping field name to shape, required flag and optional
//! category check. One generic walker consumes the tables, so the
//! unknown-vs-malformed distinction lives in exactly one place.
//!
//! Failure containment follows the structure nesting:
//! - top-level fields fail individually (the field is dropped)
//! - nested objects (`versions`, `filters`, `layout`, `gradient`) fail whole
//! - record lists (`techniques`, `legendItems`, `metadata`) fail per record
//! - scalar lists (`platforms`, gradient `colors`) fail whole
//!
//! In [`LoadMode::Strict`] the first contained failure aborts instead.
//! `name` and `domain` are checked first and abort in both modes.

use crate::color::Rgb;
use crate::diagnostic::Diagnostic;
use crate::error::{FieldError, LayerError};
use crate::gradient::Gradient;
use crate::taxonomy::{is_technique_id, Domain};
use serde_json::{Map, Value};

/// Root structure path used in diagnostics
pub const ROOT: &str = "layer";

/// Layer versions accepted after migration
pub const LAYER_VERSIONS: &[&str] = &["4.0", "4.1"];

/// Navigator versions accepted
pub const NAVIGATOR_VERSIONS: &[&str] = &["4.0", "4.1"];

/// Layout kinds accepted in `layout.layout`
pub const LAYOUT_KINDS: &[&str] = &["side", "flat", "mini"];

/// How validation failures are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadMode {
    /// Any failure aborts the load
    #[default]
    Strict,
    /// Failures drop the smallest enclosing structure with a warning
    Lenient,
}

/// Primitive JSON kind expected by a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Bool,
    Integer,
    Number,
}

impl ValueKind {
    /// Check a value's kind
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
        }
    }

    /// Expected-kind phrase for error messages
    #[must_use]
    pub fn expected(self) -> &'static str {
        match self {
            Self::String => "a string",
            Self::Bool => "a boolean",
            Self::Integer => "an integer",
            Self::Number => "a number",
        }
    }

    fn expected_list(self) -> &'static str {
        match self {
            Self::String => "an array of strings",
            Self::Bool => "an array of booleans",
            Self::Integer => "an array of integers",
            Self::Number => "an array of numbers",
        }
    }
}

/// Category check over a single value (or list element)
pub type CategoryCheck = fn(&Value, &ValidationContext) -> Result<(), String>;

/// Cross-field check run after all fields of a structure passed
pub type StructureCheck = fn(&Map<String, Value>, &ValidationContext) -> Result<(), (&'static str, String)>;

/// Value shape of a field
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    /// Single primitive
    Scalar(ValueKind),
    /// Array of primitives, validated all-or-nothing
    List(ValueKind),
    /// Nested object, validated all-or-nothing
    Object(&'static Structure),
    /// Array of objects, validated per record
    Records(&'static Structure),
}

/// One row of a structure table
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub shape: Shape,
    pub required: bool,
    pub category: Option<CategoryCheck>,
}

impl FieldRule {
    const fn optional(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: false,
            category: None,
        }
    }

    const fn required(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            required: true,
            category: None,
        }
    }

    const fn checked(mut self, category: CategoryCheck) -> Self {
        self.category = Some(category);
        self
    }
}

/// Schema of one layer structure
#[derive(Debug)]
pub struct Structure {
    pub name: &'static str,
    pub fields: &'static [FieldRule],
    pub check: Option<StructureCheck>,
}

impl Structure {
    /// Look up a field rule
    #[must_use]
    pub fn rule(&self, field: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|r| r.name == field)
    }
}

/// Facts category checks depend on
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext {
    pub domain: Domain,
}

use Shape::{List, Object, Records, Scalar};
use ValueKind::{Bool, Integer, Number, String as Str};

pub static VERSIONS: Structure = Structure {
    name: "versions",
    fields: &[
        FieldRule::required("layer", Scalar(Str)).checked(check_layer_version),
        FieldRule::optional("attack", Scalar(Str)),
        FieldRule::optional("navigator", Scalar(Str)).checked(check_navigator_version),
    ],
    check: None,
};

pub static FILTERS: Structure = Structure {
    name: "filters",
    fields: &[FieldRule::optional("platforms", List(Str)).checked(check_platform)],
    check: None,
};

pub static LAYOUT: Structure = Structure {
    name: "layout",
    fields: &[
        FieldRule::optional("layout", Scalar(Str)).checked(check_layout_kind),
        FieldRule::optional("showName", Scalar(Bool)),
        FieldRule::optional("showID", Scalar(Bool)),
    ],
    check: None,
};

pub static GRADIENT: Structure = Structure {
    name: "gradient",
    fields: &[
        FieldRule::required("colors", List(Str)).checked(check_hex_color),
        FieldRule::required("minValue", Scalar(Integer)),
        FieldRule::required("maxValue", Scalar(Integer)),
    ],
    check: Some(check_gradient),
};

pub static LEGEND_ITEM: Structure = Structure {
    name: "legendItem",
    fields: &[
        FieldRule::required("label", Scalar(Str)),
        FieldRule::required("color", Scalar(Str)).checked(check_hex_color),
    ],
    check: None,
};

pub static METADATA: Structure = Structure {
    name: "metadata",
    fields: &[
        FieldRule::optional("name", Scalar(Str)),
        FieldRule::optional("value", Scalar(Str)),
        FieldRule::optional("divider", Scalar(Bool)),
    ],
    check: Some(check_metadata_entry),
};

pub static TECHNIQUE: Structure = Structure {
    name: "technique",
    fields: &[
        FieldRule::required("techniqueID", Scalar(Str)).checked(check_technique_id),
        FieldRule::optional("tactic", Scalar(Str)).checked(check_tactic),
        FieldRule::optional("comment", Scalar(Str)),
        FieldRule::optional("enabled", Scalar(Bool)),
        FieldRule::optional("score", Scalar(Number)),
        FieldRule::optional("color", Scalar(Str)).checked(check_hex_color),
        FieldRule::optional("metadata", Records(&METADATA)),
        FieldRule::optional("showSubtechniques", Scalar(Bool)),
    ],
    check: None,
};

pub static LAYER: Structure = Structure {
    name: ROOT,
    fields: &[
        FieldRule::required("name", Scalar(Str)),
        FieldRule::required("domain", Scalar(Str)).checked(check_domain),
        FieldRule::optional("versions", Object(&VERSIONS)),
        // pre-4.0 single version string; anything still here survived migration
        FieldRule::optional("version", Scalar(Str)).checked(reject_legacy_version),
        FieldRule::optional("description", Scalar(Str)),
        FieldRule::optional("filters", Object(&FILTERS)),
        FieldRule::optional("sorting", Scalar(Integer)).checked(check_sorting),
        FieldRule::optional("layout", Object(&LAYOUT)),
        FieldRule::optional("hideDisabled", Scalar(Bool)),
        FieldRule::optional("techniques", Records(&TECHNIQUE)),
        FieldRule::optional("gradient", Object(&GRADIENT)),
        FieldRule::optional("legendItems", Records(&LEGEND_ITEM)),
        FieldRule::optional("showTacticRowBackground", Scalar(Bool)),
        FieldRule::optional("tacticRowBackground", Scalar(Str)).checked(check_hex_color),
        FieldRule::optional("selectTechniquesAcrossTactics", Scalar(Bool)),
        FieldRule::optional("selectSubtechniquesWithParent", Scalar(Bool)),
        FieldRule::optional("metadata", Records(&METADATA)),
    ],
    check: None,
};

/// Outcome of a successful validation pass
#[derive(Debug, Clone)]
pub struct Validated {
    /// Document with every rejected element removed
    pub value: Value,
    /// Domain the document was validated against
    pub domain: Domain,
    /// Warnings for dropped elements (lenient mode only)
    pub diagnostics: Vec<Diagnostic>,
}

/// Validate a migrated layer value
///
/// # Errors
/// - `LayerError::NotAnObject` if the root is not an object
/// - `LayerError::Field` for a missing or invalid `name` / `domain`, or for
///   any failure in strict mode
pub fn validate_layer(value: &Value, mode: LoadMode) -> Result<Validated, LayerError> {
    let root = value.as_object().ok_or(LayerError::NotAnObject)?;

    let domain = identify(root)?;
    let mut validator = Validator::new(mode, ValidationContext { domain });

    let mut cleaned = Map::new();
    for (key, field) in root {
        let Some(rule) = LAYER.rule(key) else {
            validator.contain(FieldError::unknown(ROOT, key.clone()), &format!("{ROOT}.{key}"))?;
            continue;
        };
        match validator.field(ROOT, rule, field) {
            Ok(kept) => {
                cleaned.insert(key.clone(), kept);
            }
            Err(err) => validator.contain(err, &format!("{ROOT}.{key}"))?,
        }
    }

    Ok(Validated {
        value: Value::Object(cleaned),
        domain,
        diagnostics: validator.diagnostics,
    })
}

/// Check `name` and `domain`; failures here are never contained
fn identify(root: &Map<String, Value>) -> Result<Domain, FieldError> {
    match root.get("name") {
        None => return Err(FieldError::missing(ROOT, "name")),
        Some(v) if !v.is_string() => return Err(FieldError::bad_type(ROOT, "name", Str.expected())),
        Some(_) => {}
    }

    let raw = match root.get("domain") {
        None => return Err(FieldError::missing(ROOT, "domain")),
        Some(Value::String(s)) => s,
        Some(_) => return Err(FieldError::bad_type(ROOT, "domain", Str.expected())),
    };
    raw.parse::<Domain>()
        .map_err(|reason| FieldError::bad_input(ROOT, "domain", reason))
}

/// Walks values against structure tables, collecting contained failures
#[derive(Debug)]
pub struct Validator {
    mode: LoadMode,
    ctx: ValidationContext,
    diagnostics: Vec<Diagnostic>,
}

impl Validator {
    /// Create validator for a mode and context
    #[must_use]
    pub fn new(mode: LoadMode, ctx: ValidationContext) -> Self {
        Self {
            mode,
            ctx,
            diagnostics: Vec::new(),
        }
    }

    /// Contain a failure: abort in strict mode, warn and drop in lenient mode
    ///
    /// `dropped` is the path of the element discarded as a result.
    pub fn contain(&mut self, err: FieldError, dropped: &str) -> Result<(), FieldError> {
        match self.mode {
            LoadMode::Strict => Err(err),
            LoadMode::Lenient => {
                self.diagnostics
                    .push(Diagnostic::warning(dropped, format!("{err}; dropped {dropped}")));
                Ok(())
            }
        }
    }

    /// Diagnostics collected so far
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Validate one field value, returning the cleaned value
    pub fn field(&mut self, path: &str, rule: &FieldRule, value: &Value) -> Result<Value, FieldError> {
        match rule.shape {
            Scalar(kind) => {
                if !kind.matches(value) {
                    return Err(FieldError::bad_type(path, rule.name, kind.expected()));
                }
                self.category(path, rule, value)?;
                Ok(value.clone())
            }
            List(kind) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| FieldError::bad_type(path, rule.name, kind.expected_list()))?;
                for item in items {
                    if !kind.matches(item) {
                        return Err(FieldError::bad_type(path, rule.name, kind.expected_list()));
                    }
                    self.category(path, rule, item)?;
                }
                Ok(value.clone())
            }
            Object(structure) => {
                let nested = format!("{path}.{}", rule.name);
                let map = self.structure(&nested, structure, value)?;
                Ok(Value::Object(map))
            }
            Records(structure) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| FieldError::bad_type(path, rule.name, "an array of objects"))?;
                let mut kept = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let record = format!("{path}.{}[{i}]", rule.name);
                    match self.structure(&record, structure, item) {
                        Ok(map) => kept.push(Value::Object(map)),
                        Err(err) => self.contain(err, &record)?,
                    }
                }
                Ok(Value::Array(kept))
            }
        }
    }

    /// Validate an object against a structure table
    ///
    /// Any failure of a direct field fails the whole structure; records
    /// nested inside it are still contained per record.
    pub fn structure(
        &mut self,
        path: &str,
        structure: &'static Structure,
        value: &Value,
    ) -> Result<Map<String, Value>, FieldError> {
        let object = value.as_object().ok_or_else(|| {
            let (parent, field) = path.rsplit_once('.').unwrap_or((ROOT, path));
            FieldError::bad_type(parent, field, "an object")
        })?;

        let mut cleaned = Map::new();
        for (key, field) in object {
            let rule = structure
                .rule(key)
                .ok_or_else(|| FieldError::unknown(path, key.clone()))?;
            let kept = self.field(path, rule, field)?;
            cleaned.insert(key.clone(), kept);
        }

        if let Some(missing) = structure
            .fields
            .iter()
            .find(|r| r.required && !cleaned.contains_key(r.name))
        {
            return Err(FieldError::missing(path, missing.name));
        }

        if let Some(check) = structure.check {
            check(&cleaned, &self.ctx).map_err(|(field, reason)| FieldError::bad_input(path, field, reason))?;
        }
        Ok(cleaned)
    }

    fn category(&self, path: &str, rule: &FieldRule, value: &Value) -> Result<(), FieldError> {
        match rule.category {
            Some(check) => check(value, &self.ctx).map_err(|reason| FieldError::bad_input(path, rule.name, reason)),
            None => Ok(()),
        }
    }
}

fn text(value: &Value) -> &str {
    value.as_str().unwrap_or_default()
}

fn one_of(value: &Value, allowed: &[&str], what: &str) -> Result<(), String> {
    let v = text(value);
    if allowed.contains(&v) {
        Ok(())
    } else {
        Err(format!("'{v}' is not a valid {what} (expected one of {})", allowed.join(", ")))
    }
}

fn check_domain(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    text(value).parse::<Domain>().map(|_| ())
}

fn check_layer_version(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    one_of(value, LAYER_VERSIONS, "layer version")
}

fn check_navigator_version(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    one_of(value, NAVIGATOR_VERSIONS, "navigator version")
}

fn reject_legacy_version(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    Err(format!("unsupported legacy version '{}'", text(value)))
}

fn check_layout_kind(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    one_of(value, LAYOUT_KINDS, "layout")
}

fn check_platform(value: &Value, ctx: &ValidationContext) -> Result<(), String> {
    one_of(value, ctx.domain.platforms(), &format!("{} platform", ctx.domain))
}

fn check_sorting(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    match value.as_i64() {
        Some(0..=3) => Ok(()),
        _ => Err(format!("{value} is not a sort mode (expected 0 to 3)")),
    }
}

fn check_hex_color(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    let v = text(value);
    if Rgb::is_valid_hex(v) {
        Ok(())
    } else {
        Err(format!("'{v}' is not a hex color"))
    }
}

fn check_technique_id(value: &Value, _ctx: &ValidationContext) -> Result<(), String> {
    let v = text(value);
    if is_technique_id(v) {
        Ok(())
    } else {
        Err(format!("'{v}' is not a technique id (expected T#### or T####.###)"))
    }
}

fn check_tactic(value: &Value, ctx: &ValidationContext) -> Result<(), String> {
    let v = text(value);
    if ctx.domain.tactic_display_name(v).is_some() {
        Ok(())
    } else {
        Err(format!("'{v}' is not a {} tactic", ctx.domain))
    }
}

fn check_gradient(map: &Map<String, Value>, _ctx: &ValidationContext) -> Result<(), (&'static str, String)> {
    let colors: Vec<&str> = map
        .get("colors")
        .and_then(Value::as_array)
        .map(|a| a.iter().map(text).collect())
        .unwrap_or_default();
    let bound = |key: &'static str| {
        map.get(key)
            .and_then(Value::as_i64)
            .ok_or_else(|| (key, "out of range for a 64-bit integer".to_string()))
    };
    Gradient::new(&colors, bound("minValue")?, bound("maxValue")?)
        .map(|_| ())
        .map_err(|err| ("colors", err.to_string()))
}

fn check_metadata_entry(map: &Map<String, Value>, _ctx: &ValidationContext) -> Result<(), (&'static str, String)> {
    let has = |key: &str| map.contains_key(key);
    match (has("divider"), has("name"), has("value")) {
        (true, false, false) | (false, true, true) => Ok(()),
        (true, _, _) => Err(("divider", "a divider cannot carry a name or value".to_string())),
        (false, false, _) => Err(("name", "required unless the entry is a divider".to_string())),
        (false, true, false) => Err(("value", "required unless the entry is a divider".to_string())),
    }
}
