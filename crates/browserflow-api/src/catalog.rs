//! Built-in catalog of automation blocks.
//!
//! The builder's palette is static: every block the editor can place on the
//! canvas, grouped by category. Blocks that map to a browser action name the
//! `/api/actions/*` endpoint that will run them.

use serde::Serialize;

/// A palette category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

/// One block of the palette.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: &'static str,
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<&'static str>,
}

/// Query over the block list.
#[derive(Debug, Clone, Default)]
pub struct BlockFilter<'a> {
    pub category: Option<&'a str>,
    pub search: Option<&'a str>,
}

/// One page of blocks.
#[derive(Debug, Clone, Serialize)]
pub struct BlockPage {
    pub items: Vec<Block>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
}

/// The block catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
    blocks: Vec<Block>,
}

impl Catalog {
    pub fn new(categories: Vec<Category>, blocks: Vec<Block>) -> Self {
        Self { categories, blocks }
    }

    /// Catalog shipped with the builder.
    pub fn builtin() -> Self {
        Self::new(builtin_categories(), builtin_blocks())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn blocks_in(&self, category: &str) -> Vec<&Block> {
        self.blocks.iter().filter(|b| b.category == category).collect()
    }

    /// Filter blocks, then cut out page `page` (1-based) of `limit` items.
    pub fn search(&self, filter: &BlockFilter<'_>, page: usize, limit: usize) -> BlockPage {
        let needle = filter.search.map(str::to_lowercase);
        let matching: Vec<&Block> = self
            .blocks
            .iter()
            .filter(|b| filter.category.is_none_or(|c| b.category == c))
            .filter(|b| {
                needle.as_deref().is_none_or(|n| {
                    b.name.to_lowercase().contains(n) || b.description.to_lowercase().contains(n)
                })
            })
            .collect();

        let total = matching.len();
        let page = page.max(1);
        let items = matching
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .cloned()
            .collect();

        BlockPage {
            items,
            page,
            limit,
            total,
        }
    }
}

fn builtin_categories() -> Vec<Category> {
    vec![
        Category {
            id: "navigation",
            name: "Navigation",
            description: "Open pages and move through history",
            icon: "compass",
        },
        Category {
            id: "interaction",
            name: "Interaction",
            description: "Click, type and otherwise act on page elements",
            icon: "pointer",
        },
        Category {
            id: "extraction",
            name: "Extraction",
            description: "Read text and attributes from the page",
            icon: "download",
        },
        Category {
            id: "flow-control",
            name: "Flow control",
            description: "Waits, branches and loops",
            icon: "git-branch",
        },
        Category {
            id: "capture",
            name: "Capture",
            description: "Screenshots of pages and elements",
            icon: "camera",
        },
        Category {
            id: "variables",
            name: "Variables",
            description: "Store and reuse values between steps",
            icon: "database",
        },
    ]
}

fn builtin_blocks() -> Vec<Block> {
    vec![
        Block {
            id: "navigate",
            name: "Open URL",
            category: "navigation",
            description: "Load a page and wait until it is ready",
            action: Some("navigate"),
        },
        Block {
            id: "go-back",
            name: "Go back",
            category: "navigation",
            description: "Return to the previous page in history",
            action: None,
        },
        Block {
            id: "reload",
            name: "Reload page",
            category: "navigation",
            description: "Reload the current page",
            action: None,
        },
        Block {
            id: "click",
            name: "Click element",
            category: "interaction",
            description: "Click the element matching a selector",
            action: Some("click"),
        },
        Block {
            id: "type-text",
            name: "Type text",
            category: "interaction",
            description: "Type text into an input field",
            action: Some("type"),
        },
        Block {
            id: "select-option",
            name: "Select option",
            category: "interaction",
            description: "Choose an option in a dropdown",
            action: None,
        },
        Block {
            id: "extract-text",
            name: "Extract text",
            category: "extraction",
            description: "Read the text content of matching elements",
            action: Some("extract"),
        },
        Block {
            id: "extract-attribute",
            name: "Extract attribute",
            category: "extraction",
            description: "Read an attribute such as href or src",
            action: Some("extract"),
        },
        Block {
            id: "wait-for-element",
            name: "Wait for element",
            category: "flow-control",
            description: "Pause until an element appears on the page",
            action: Some("wait"),
        },
        Block {
            id: "wait-duration",
            name: "Wait",
            category: "flow-control",
            description: "Pause for a fixed number of milliseconds",
            action: Some("wait"),
        },
        Block {
            id: "condition",
            name: "If / else",
            category: "flow-control",
            description: "Branch on the value of a variable",
            action: None,
        },
        Block {
            id: "loop",
            name: "Repeat",
            category: "flow-control",
            description: "Run the nested steps for each item of a list",
            action: None,
        },
        Block {
            id: "screenshot",
            name: "Take screenshot",
            category: "capture",
            description: "Capture the page or a single element as an image",
            action: Some("screenshot"),
        },
        Block {
            id: "set-variable",
            name: "Set variable",
            category: "variables",
            description: "Store a value under a name",
            action: None,
        },
    ]
}
