//! Inline CSS declarations.
//!
//! Only the properties that influence a spreadsheet cell are kept. Each has
//! its own field, so resolving a cell style is a plain field read instead of
//! a string lookup.

use phf::phf_map;

use crate::html::StyleAttributes;

/// CSS properties understood by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    TextAlign,
    VerticalAlign,
    FontWeight,
    FontStyle,
    FontFamily,
    FontSize,
    TextDecoration,
    Color,
    BackgroundColor,
    Background,
    Border,
    BorderTop,
    BorderRight,
    BorderBottom,
    BorderLeft,
    Width,
    Padding,
    PaddingTop,
    PaddingRight,
    PaddingBottom,
    PaddingLeft,
    Display,
    WhiteSpace,
}

static PROPERTIES: phf::Map<&'static str, Property> = phf_map! {
    "text-align" => Property::TextAlign,
    "vertical-align" => Property::VerticalAlign,
    "font-weight" => Property::FontWeight,
    "font-style" => Property::FontStyle,
    "font-family" => Property::FontFamily,
    "font-size" => Property::FontSize,
    "text-decoration" => Property::TextDecoration,
    "text-decoration-line" => Property::TextDecoration,
    "color" => Property::Color,
    "background-color" => Property::BackgroundColor,
    "background" => Property::Background,
    "border" => Property::Border,
    "border-top" => Property::BorderTop,
    "border-right" => Property::BorderRight,
    "border-bottom" => Property::BorderBottom,
    "border-left" => Property::BorderLeft,
    "width" => Property::Width,
    "padding" => Property::Padding,
    "padding-top" => Property::PaddingTop,
    "padding-right" => Property::PaddingRight,
    "padding-bottom" => Property::PaddingBottom,
    "padding-left" => Property::PaddingLeft,
    "display" => Property::Display,
    "white-space" => Property::WhiteSpace,
};

impl Property {
    /// Look up a property by its (case-insensitive) CSS name.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            PROPERTIES.get(name.to_ascii_lowercase().as_str()).copied()
        } else {
            PROPERTIES.get(name).copied()
        }
    }

    /// Properties a cell picks up from its row.
    fn is_inherited_from_row(self) -> bool {
        matches!(
            self,
            Property::TextAlign
                | Property::VerticalAlign
                | Property::FontWeight
                | Property::FontStyle
                | Property::FontFamily
                | Property::FontSize
                | Property::TextDecoration
                | Property::Color
                | Property::BackgroundColor
                | Property::Background
                | Property::WhiteSpace
        )
    }
}

/// Canonical set of declarations from one element.
///
/// # Examples
///
/// ```
/// use htmlgrid::style::StyleProperties;
///
/// let props = StyleProperties::parse("color: red; FONT-WEIGHT : bold; color: blue; junk");
/// assert_eq!(props.color.as_deref(), Some("blue"));
/// assert_eq!(props.font_weight.as_deref(), Some("bold"));
/// assert_eq!(props.malformed(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StyleProperties {
    pub text_align: Option<String>,
    pub vertical_align: Option<String>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<String>,
    pub text_decoration: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<String>,
    pub border: Option<String>,
    pub border_top: Option<String>,
    pub border_right: Option<String>,
    pub border_bottom: Option<String>,
    pub border_left: Option<String>,
    pub width: Option<String>,
    pub padding: Option<String>,
    pub padding_top: Option<String>,
    pub padding_right: Option<String>,
    pub padding_bottom: Option<String>,
    pub padding_left: Option<String>,
    pub display: Option<String>,
    pub white_space: Option<String>,
    malformed: u16,
}

impl StyleProperties {
    /// Parse an inline `style` attribute.
    ///
    /// Declarations are split on `;` and then on the first `:`. A later
    /// declaration of the same property replaces an earlier one. Fragments
    /// without a colon are dropped and counted in [`malformed`](Self::malformed).
    pub fn parse(raw: &str) -> Self {
        let mut props = Self::default();

        for declaration in raw.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let Some(colon) = memchr::memchr(b':', declaration.as_bytes()) else {
                props.malformed = props.malformed.saturating_add(1);
                continue;
            };

            let name = declaration[..colon].trim();
            let value = declaration[colon + 1..].trim();
            let value = value
                .strip_suffix("!important")
                .map_or(value, str::trim_end);
            if name.is_empty() || value.is_empty() {
                props.malformed = props.malformed.saturating_add(1);
                continue;
            }

            // Unknown properties are valid CSS; they just don't matter here.
            if let Some(property) = Property::from_name(name) {
                props.set(property, value.to_string());
            }
        }

        props
    }

    /// Map presentational HTML attributes to their CSS equivalents.
    pub fn from_attributes(attributes: &StyleAttributes) -> Self {
        let mut props = Self::default();
        if let Some(ref bgcolor) = attributes.bgcolor {
            props.set(Property::BackgroundColor, bgcolor.trim().to_string());
        }
        if let Some(ref align) = attributes.align {
            props.set(Property::TextAlign, align.trim().to_string());
        }
        if let Some(ref valign) = attributes.valign {
            props.set(Property::VerticalAlign, valign.trim().to_string());
        }
        if let Some(ref width) = attributes.width {
            props.set(Property::Width, width.trim().to_string());
        }
        props
    }

    /// Number of fragments that could not be read as a declaration.
    #[inline]
    pub fn malformed(&self) -> u16 {
        self.malformed
    }

    /// Whether no declaration was recognized.
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|field| field.is_none())
    }

    fn fields(&self) -> [&Option<String>; 22] {
        [
            &self.text_align,
            &self.vertical_align,
            &self.font_weight,
            &self.font_style,
            &self.font_family,
            &self.font_size,
            &self.text_decoration,
            &self.color,
            &self.background_color,
            &self.border,
            &self.border_top,
            &self.border_right,
            &self.border_bottom,
            &self.border_left,
            &self.width,
            &self.padding,
            &self.padding_top,
            &self.padding_right,
            &self.padding_bottom,
            &self.padding_left,
            &self.display,
            &self.white_space,
        ]
    }

    fn slot(&mut self, property: Property) -> &mut Option<String> {
        match property {
            Property::TextAlign => &mut self.text_align,
            Property::VerticalAlign => &mut self.vertical_align,
            Property::FontWeight => &mut self.font_weight,
            Property::FontStyle => &mut self.font_style,
            Property::FontFamily => &mut self.font_family,
            Property::FontSize => &mut self.font_size,
            Property::TextDecoration => &mut self.text_decoration,
            Property::Color => &mut self.color,
            // Only the color part of the shorthand is of any use.
            Property::BackgroundColor | Property::Background => &mut self.background_color,
            Property::Border => &mut self.border,
            Property::BorderTop => &mut self.border_top,
            Property::BorderRight => &mut self.border_right,
            Property::BorderBottom => &mut self.border_bottom,
            Property::BorderLeft => &mut self.border_left,
            Property::Width => &mut self.width,
            Property::Padding => &mut self.padding,
            Property::PaddingTop => &mut self.padding_top,
            Property::PaddingRight => &mut self.padding_right,
            Property::PaddingBottom => &mut self.padding_bottom,
            Property::PaddingLeft => &mut self.padding_left,
            Property::Display => &mut self.display,
            Property::WhiteSpace => &mut self.white_space,
        }
    }

    fn get(&self, property: Property) -> Option<&String> {
        match property {
            Property::TextAlign => self.text_align.as_ref(),
            Property::VerticalAlign => self.vertical_align.as_ref(),
            Property::FontWeight => self.font_weight.as_ref(),
            Property::FontStyle => self.font_style.as_ref(),
            Property::FontFamily => self.font_family.as_ref(),
            Property::FontSize => self.font_size.as_ref(),
            Property::TextDecoration => self.text_decoration.as_ref(),
            Property::Color => self.color.as_ref(),
            Property::BackgroundColor | Property::Background => self.background_color.as_ref(),
            Property::Border => self.border.as_ref(),
            Property::BorderTop => self.border_top.as_ref(),
            Property::BorderRight => self.border_right.as_ref(),
            Property::BorderBottom => self.border_bottom.as_ref(),
            Property::BorderLeft => self.border_left.as_ref(),
            Property::Width => self.width.as_ref(),
            Property::Padding => self.padding.as_ref(),
            Property::PaddingTop => self.padding_top.as_ref(),
            Property::PaddingRight => self.padding_right.as_ref(),
            Property::PaddingBottom => self.padding_bottom.as_ref(),
            Property::PaddingLeft => self.padding_left.as_ref(),
            Property::Display => self.display.as_ref(),
            Property::WhiteSpace => self.white_space.as_ref(),
        }
    }

    /// Set one property, replacing any earlier value.
    pub fn set(&mut self, property: Property, value: String) {
        *self.slot(property) = Some(value);
    }

    /// Apply `other` on top of `self`; every property `other` declares wins.
    pub fn overlay(&mut self, other: &StyleProperties) {
        for property in ALL_PROPERTIES {
            if let Some(value) = other.get(property) {
                *self.slot(property) = Some(value.clone());
            }
        }
        self.malformed = self.malformed.saturating_add(other.malformed);
    }

    /// Fill properties the cell leaves unset from its row.
    pub fn inherit_from_row(&mut self, row: &StyleProperties) {
        for property in ALL_PROPERTIES {
            if !property.is_inherited_from_row() {
                continue;
            }
            if self.get(property).is_none()
                && let Some(value) = row.get(property)
            {
                *self.slot(property) = Some(value.clone());
            }
        }
    }

    /// Whether the element is hidden with `display: none`.
    pub fn is_hidden(&self) -> bool {
        self.display
            .as_deref()
            .is_some_and(|display| display.eq_ignore_ascii_case("none"))
    }
}

const ALL_PROPERTIES: [Property; 22] = [
    Property::TextAlign,
    Property::VerticalAlign,
    Property::FontWeight,
    Property::FontStyle,
    Property::FontFamily,
    Property::FontSize,
    Property::TextDecoration,
    Property::Color,
    Property::BackgroundColor,
    Property::Border,
    Property::BorderTop,
    Property::BorderRight,
    Property::BorderBottom,
    Property::BorderLeft,
    Property::Width,
    Property::Padding,
    Property::PaddingTop,
    Property::PaddingRight,
    Property::PaddingBottom,
    Property::PaddingLeft,
    Property::Display,
    Property::WhiteSpace,
];

/// Whether an inline style hides its element.
///
/// # Examples
///
/// ```
/// use htmlgrid::style::is_display_none;
///
/// assert!(is_display_none("color: red; DISPLAY : None"));
/// assert!(!is_display_none("display: block"));
/// ```
pub fn is_display_none(raw_style: &str) -> bool {
    StyleProperties::parse(raw_style).is_hidden()
}
