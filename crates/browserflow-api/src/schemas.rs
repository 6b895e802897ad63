//! Request schemas for every validated route, keyed by operation name.

use browserflow_validation::{
    Condition, FieldRule, RegistryError, SectionSchema, StaticSchemaRegistry, ValidationConfig,
};

pub const CATALOG_LIST: &str = "catalog.list";
pub const CATALOG_GET: &str = "catalog.get";
pub const CATEGORIES_GET: &str = "categories.get";
pub const ACTIONS_NAVIGATE: &str = "actions.navigate";
pub const ACTIONS_CLICK: &str = "actions.click";
pub const ACTIONS_TYPE: &str = "actions.type";
pub const ACTIONS_EXTRACT: &str = "actions.extract";
pub const ACTIONS_WAIT: &str = "actions.wait";
pub const ACTIONS_SCREENSHOT: &str = "actions.screenshot";
pub const VARIABLES_GET: &str = "variables.get";
pub const VARIABLES_SET: &str = "variables.set";

const SLUG_PATTERN: &str = r"^[a-z0-9][a-z0-9-]*$";
const VARIABLE_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_.-]*$";

/// Build the registry with all route schemas.
pub fn build_registry() -> Result<StaticSchemaRegistry, RegistryError> {
    let mut registry = StaticSchemaRegistry::new();

    registry.register(CATALOG_LIST, ValidationConfig::new().with_query(catalog_query()))?;
    registry.register(CATALOG_GET, ValidationConfig::new().with_params(slug_params()))?;
    registry.register(CATEGORIES_GET, ValidationConfig::new().with_params(slug_params()))?;

    registry.register(ACTIONS_NAVIGATE, ValidationConfig::new().with_body(navigate_body()))?;
    registry.register(ACTIONS_CLICK, ValidationConfig::new().with_body(click_body()))?;
    registry.register(ACTIONS_TYPE, ValidationConfig::new().with_body(type_body()))?;
    registry.register(ACTIONS_EXTRACT, ValidationConfig::new().with_body(extract_body()))?;
    registry.register(ACTIONS_WAIT, ValidationConfig::new().with_body(wait_body()))?;
    registry.register(
        ACTIONS_SCREENSHOT,
        ValidationConfig::new().with_body(screenshot_body()),
    )?;

    registry.register(
        VARIABLES_GET,
        ValidationConfig::new().with_params(variable_params()),
    )?;
    registry.register(
        VARIABLES_SET,
        ValidationConfig::new()
            .with_params(variable_params())
            .with_body(SectionSchema::new().field(
                "value",
                FieldRule::any().required().describe("Any JSON value"),
            )),
    )?;

    Ok(registry)
}

fn catalog_query() -> SectionSchema {
    SectionSchema::new()
        .field("category", FieldRule::string().pattern(SLUG_PATTERN))
        .field("search", FieldRule::string().max(100))
        .field("page", FieldRule::integer().min(1).max(10_000).default(1))
        .field("limit", FieldRule::integer().min(1).max(100).default(20))
}

fn slug_params() -> SectionSchema {
    SectionSchema::new().field(
        "id",
        FieldRule::string().pattern(SLUG_PATTERN).max(64).required(),
    )
}

fn variable_params() -> SectionSchema {
    SectionSchema::new().field(
        "name",
        FieldRule::string()
            .pattern(VARIABLE_NAME_PATTERN)
            .max(64)
            .required(),
    )
}

fn selector() -> FieldRule {
    FieldRule::string().max(1024).describe("CSS selector of the target element")
}

fn navigate_body() -> SectionSchema {
    SectionSchema::new()
        .field(
            "url",
            FieldRule::string()
                .pattern(r"^https?://")
                .max(2048)
                .required()
                .describe("Absolute http(s) URL to open"),
        )
        .field(
            "waitUntil",
            FieldRule::string()
                .valid(["load", "domcontentloaded", "networkidle"])
                .default("load"),
        )
        .field(
            "timeout",
            FieldRule::integer().min(0).max(300_000).default(30_000),
        )
}

fn click_body() -> SectionSchema {
    SectionSchema::new()
        .field("selector", selector().required())
        .field(
            "button",
            FieldRule::string()
                .valid(["left", "right", "middle"])
                .default("left"),
        )
        .field("clickCount", FieldRule::integer().min(1).max(3).default(1))
}

fn type_body() -> SectionSchema {
    SectionSchema::new()
        .field("selector", selector().required())
        .field("text", FieldRule::string().allow_empty().required())
        .field(
            "delay",
            FieldRule::integer()
                .min(0)
                .max(1000)
                .default(0)
                .describe("Delay between key presses in milliseconds"),
        )
}

fn extract_body() -> SectionSchema {
    SectionSchema::new()
        .field("selector", selector().required())
        .field(
            "attribute",
            FieldRule::string().describe("Attribute to read instead of the text content"),
        )
        .field("multiple", FieldRule::boolean().default(false))
        .field(
            "saveAs",
            FieldRule::string()
                .pattern(VARIABLE_NAME_PATTERN)
                .describe("Flow variable that receives the result"),
        )
}

fn wait_body() -> SectionSchema {
    SectionSchema::new()
        .field(
            "type",
            FieldRule::string()
                .valid(["selector", "timeout", "navigation"])
                .required(),
        )
        .field(
            "selector",
            selector().when(
                Condition::new("type", "selector", selector().required())
                    .otherwise(FieldRule::string().forbidden()),
            ),
        )
        .field(
            "duration",
            FieldRule::integer().when(
                Condition::new(
                    "type",
                    "timeout",
                    FieldRule::integer().min(0).max(300_000).required(),
                )
                .otherwise(FieldRule::integer().forbidden()),
            ),
        )
        .field(
            "timeout",
            FieldRule::integer().min(0).max(300_000).default(30_000),
        )
}

fn screenshot_body() -> SectionSchema {
    SectionSchema::new()
        .field("fullPage", FieldRule::boolean().default(false))
        .field("selector", selector())
        .field(
            "format",
            FieldRule::string().valid(["png", "jpeg"]).default("png"),
        )
        .field(
            "quality",
            FieldRule::integer().when(
                Condition::new("format", "jpeg", FieldRule::integer().min(0).max(100))
                    .otherwise(FieldRule::integer().forbidden()),
            ),
        )
}
