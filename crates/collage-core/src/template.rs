//! Collage templates: named sets of polygon cells in normalized coordinates.
//!
//! A library can be loaded from TOML (`[[template]]` tables) or JSON (a
//! top-level array). Every template is validated on load.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template `{0}` has no cells")]
    NoCells(String),
    #[error("template `{name}` cell {cell} has {points} points, at least 3 are required")]
    DegenerateCell {
        name: String,
        cell: usize,
        points: usize,
    },
    #[error("template `{name}` cell {cell} has a point outside [0,1]: ({x}, {y})")]
    OutOfRange {
        name: String,
        cell: usize,
        x: f64,
        y: f64,
    },
    #[error("template library is empty")]
    EmptyLibrary,
    #[error("failed to read template library: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse template library: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("failed to parse template library: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    pub x: f64,
    pub y: f64,
}

impl NormPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn in_unit_square(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

/// A closed polygon; the last point connects back to the first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon(Vec<NormPoint>);

impl Polygon {
    pub fn new(points: Vec<NormPoint>) -> Self {
        Self(points)
    }

    pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self(vec![
            NormPoint::new(x, y),
            NormPoint::new(x + w, y),
            NormPoint::new(x + w, y + h),
            NormPoint::new(x, y + h),
        ])
    }

    pub fn points(&self) -> &[NormPoint] {
        &self.0
    }
}

impl From<&[(f64, f64)]> for Polygon {
    fn from(points: &[(f64, f64)]) -> Self {
        Self(points.iter().map(|&(x, y)| NormPoint::new(x, y)).collect())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub cells: Vec<Polygon>,
}

impl Template {
    pub fn new(name: impl Into<String>, cells: Vec<Polygon>) -> Result<Self, TemplateError> {
        let template = Self {
            name: name.into(),
            cells,
        };
        template.validate()?;
        Ok(template)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.cells.is_empty() {
            return Err(TemplateError::NoCells(self.name.clone()));
        }
        for (cell, polygon) in self.cells.iter().enumerate() {
            if polygon.points().len() < 3 {
                return Err(TemplateError::DegenerateCell {
                    name: self.name.clone(),
                    cell,
                    points: polygon.points().len(),
                });
            }
            if let Some(p) = polygon.points().iter().find(|p| !p.in_unit_square()) {
                return Err(TemplateError::OutOfRange {
                    name: self.name.clone(),
                    cell,
                    x: p.x,
                    y: p.y,
                });
            }
        }
        Ok(())
    }

    // Built-in templates are constant data known to be valid.
    fn builtin(name: &str, cells: Vec<Polygon>) -> Self {
        Self {
            name: name.to_string(),
            cells,
        }
    }
}

/// An ordered, validated list of templates; selected by index.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateLibrary {
    #[serde(rename = "template", default)]
    templates: Vec<Template>,
}

impl TemplateLibrary {
    pub fn new(templates: Vec<Template>) -> Result<Self, TemplateError> {
        if templates.is_empty() {
            return Err(TemplateError::EmptyLibrary);
        }
        for template in &templates {
            template.validate()?;
        }
        Ok(Self { templates })
    }

    /// The templates shipped with the editor.
    pub fn builtin() -> Self {
        let slant: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0), (1.0, 0.28), (0.0, 0.38)];
        let slant_mid: &[(f64, f64)] = &[(0.0, 0.38), (1.0, 0.28), (1.0, 0.62), (0.0, 0.72)];
        let slant_low: &[(f64, f64)] = &[(0.0, 0.72), (1.0, 0.62), (1.0, 1.0), (0.0, 1.0)];
        let upper: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)];
        let lower: &[(f64, f64)] = &[(1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

        let templates = vec![
            Template::builtin(
                "Two rows",
                vec![Polygon::rect(0.0, 0.0, 1.0, 0.5), Polygon::rect(0.0, 0.5, 1.0, 0.5)],
            ),
            Template::builtin("Diagonal", vec![upper.into(), lower.into()]),
            Template::builtin(
                "Three rows",
                (0..3)
                    .map(|i| Polygon::rect(0.0, i as f64 / 3.0, 1.0, 1.0 / 3.0))
                    .collect(),
            ),
            Template::builtin(
                "Slanted trio",
                vec![slant.into(), slant_mid.into(), slant_low.into()],
            ),
            Template::builtin("Grid 2x2", grid(2, 2)),
            Template::builtin("Grid 2x3", grid(2, 3)),
        ];
        Self { templates }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TemplateError> {
        let parsed: TemplateLibrary = toml::from_str(content)?;
        Self::new(parsed.templates)
    }

    pub fn from_json_str(content: &str) -> Result<Self, TemplateError> {
        let templates: Vec<Template> = serde_json::from_str(content)?;
        Self::new(templates)
    }

    /// Load a library file; `.json` is parsed as JSON, anything else as TOML.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let library = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        log::info!("loaded {} templates from {}", library.len(), path.display());
        Ok(library)
    }

    pub fn get(&self, index: usize) -> Option<&Template> {
        self.templates.get(index)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }
}

fn grid(cols: usize, rows: usize) -> Vec<Polygon> {
    let w = 1.0 / cols as f64;
    let h = 1.0 / rows as f64;
    (0..rows)
        .flat_map(|r| (0..cols).map(move |c| Polygon::rect(c as f64 * w, r as f64 * h, w, h)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_valid() {
        let lib = TemplateLibrary::builtin();
        assert!(!lib.is_empty());
        for t in lib.iter() {
            t.validate().unwrap();
        }
        let counts: Vec<usize> = lib.iter().map(Template::cell_count).collect();
        assert_eq!(counts, vec![2, 2, 3, 3, 4, 6]);
    }

    #[test]
    fn rejects_degenerate_cells() {
        let err = Template::new("bad", vec![Polygon::new(vec![NormPoint::new(0.0, 0.0)])])
            .unwrap_err();
        assert!(matches!(err, TemplateError::DegenerateCell { points: 1, .. }));
    }

    #[test]
    fn rejects_out_of_range_points() {
        let err = Template::new("wide", vec![Polygon::rect(0.5, 0.0, 1.0, 1.0)]).unwrap_err();
        assert!(matches!(err, TemplateError::OutOfRange { cell: 0, .. }));
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(
            Template::new("none", Vec::new()),
            Err(TemplateError::NoCells(_))
        ));
        assert!(matches!(
            TemplateLibrary::new(Vec::new()),
            Err(TemplateError::EmptyLibrary)
        ));
    }

    #[test]
    fn parses_toml() {
        let src = r#"
            [[template]]
            name = "Halves"
            cells = [
                [{ x = 0.0, y = 0.0 }, { x = 0.5, y = 0.0 }, { x = 0.5, y = 1.0 }, { x = 0.0, y = 1.0 }],
                [{ x = 0.5, y = 0.0 }, { x = 1.0, y = 0.0 }, { x = 1.0, y = 1.0 }, { x = 0.5, y = 1.0 }],
            ]
        "#;
        let lib = TemplateLibrary::from_toml_str(src).unwrap();
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get(0).map(|t| t.cell_count()), Some(2));
    }

    #[test]
    fn parses_json() {
        let src = r#"[{"name":"Tri","cells":[[{"x":0,"y":0},{"x":1,"y":0},{"x":0,"y":1}]]}]"#;
        let lib = TemplateLibrary::from_json_str(src).unwrap();
        assert_eq!(lib.get(0).map(|t| t.name.as_str()), Some("Tri"));
    }
}
