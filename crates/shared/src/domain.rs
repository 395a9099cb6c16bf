use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Text height sent with every preview and generation request.
pub const DEFAULT_TEXT_HEIGHT: u32 = 20;

pub const DEFAULT_FONT: &str = "Arial";

const MAX_TEMPLATE_NAME_LEN: usize = 64;

const BUILTIN_FONTS: &[&str] = &[
    "Arial",
    "Roboto",
    "Open Sans",
    "Lato",
    "Montserrat",
    "Poppins",
    "Oswald",
    "Raleway",
    "Ubuntu",
    "Orbitron",
    "Impact",
    "Georgia",
    "Courier New",
    "Trebuchet MS",
    "Verdana",
    "Noto Sans",
    "Playfair Display",
    "Rubik",
    "Quicksand",
    "Source Sans Pro",
    "Merriweather",
    "Work Sans",
    "Nunito",
    "Cabin",
    "Fira Sans",
    "Anton",
    "Barlow",
    "Exo",
    "Teko",
    "Baloo 2",
];

macro_rules! name_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

name_newtype!(FontName);
name_newtype!(TemplateName);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Straight,
    Arched,
    Circular,
    Monogram,
    Stacked,
}

impl Layout {
    pub const ALL: [Layout; 5] = [
        Layout::Straight,
        Layout::Arched,
        Layout::Circular,
        Layout::Monogram,
        Layout::Stacked,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Layout::Straight => "straight",
            Layout::Arched => "arched",
            Layout::Circular => "circular",
            Layout::Monogram => "monogram",
            Layout::Stacked => "stacked",
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Layout::ALL
            .into_iter()
            .find(|layout| layout.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| DomainError::UnknownLayout(raw.to_string()))
    }
}

impl TemplateName {
    /// Templates are short identifiers; the service draws nothing for names it
    /// does not know, so any well-formed identifier is accepted.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        let well_formed = !trimmed.is_empty()
            && trimmed.len() <= MAX_TEMPLATE_NAME_LEN
            && trimmed
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
        if well_formed {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(DomainError::InvalidTemplate(raw.to_string()))
        }
    }
}

/// Closed set of font families the client lets a design use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontCatalog {
    families: Vec<String>,
}

impl Default for FontCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FontCatalog {
    pub fn builtin() -> Self {
        Self {
            families: BUILTIN_FONTS.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// Adds families on top of the built-in set. Blank and duplicate names are skipped.
    pub fn with_extra<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in extra {
            let name = name.as_ref().trim();
            if !name.is_empty() && !self.contains(name) {
                self.families.push(name.to_string());
            }
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.families.iter().any(|family| family == name)
    }

    pub fn resolve(&self, name: &str) -> Result<FontName, DomainError> {
        let trimmed = name.trim();
        if self.contains(trimmed) {
            Ok(FontName(trimmed.to_string()))
        } else {
            Err(DomainError::UnknownFont(name.to_string()))
        }
    }

    pub fn default_font(&self) -> FontName {
        FontName(DEFAULT_FONT.to_string())
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

/// Everything the service needs to render a design.
///
/// Values are never edited in place: every `with_*` call returns a new request,
/// so observers can treat each value as a distinct edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignRequest {
    text: String,
    layout: Layout,
    font: FontName,
    template: Option<TemplateName>,
    height: u32,
}

impl Default for DesignRequest {
    fn default() -> Self {
        Self {
            text: String::new(),
            layout: Layout::default(),
            font: FontName(DEFAULT_FONT.to_string()),
            template: None,
            height: DEFAULT_TEXT_HEIGHT,
        }
    }
}

impl DesignRequest {
    pub fn new(text: impl Into<String>, layout: Layout, font: FontName) -> Self {
        Self {
            text: text.into(),
            layout,
            font,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn font(&self) -> &FontName {
        &self.font
    }

    pub fn template(&self) -> Option<&TemplateName> {
        self.template.as_ref()
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whitespace-only text counts as "nothing to render".
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self.clone()
        }
    }

    pub fn with_layout(&self, layout: Layout) -> Self {
        Self {
            layout,
            ..self.clone()
        }
    }

    pub fn with_font(&self, font: FontName) -> Self {
        Self {
            font,
            ..self.clone()
        }
    }

    pub fn with_template(&self, template: Option<TemplateName>) -> Self {
        Self {
            template,
            ..self.clone()
        }
    }

    pub fn with_height(&self, height: u32) -> Result<Self, DomainError> {
        if height == 0 {
            return Err(DomainError::InvalidHeight);
        }
        Ok(Self {
            height,
            ..self.clone()
        })
    }
}
