//! Permissive line-oriented model reader

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::analysis::ResultType;
use crate::elements::{CoordinateFrame, Element, Material, Node, Restraint, ShellParameter};
use crate::error::FemResult;
use crate::loads::Load;
use crate::model::FemDataModel;
use crate::results::{Quantity, ResultRecord};

/// Tokens of one input line; index 0 is the keyword
struct Record<'a> {
    tokens: Vec<&'a str>,
}

impl<'a> Record<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace().collect(),
        }
    }

    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn num(&self, i: usize) -> Option<f64> {
        self.tokens.get(i)?.parse().ok()
    }

    fn label(&self, i: usize) -> Option<i64> {
        let token = self.tokens.get(i)?;
        token.parse::<i64>().ok().or_else(|| {
            // Labels written as floats, e.g. "12.0"
            let v: f64 = token.parse().ok()?;
            (v.fract() == 0.0).then_some(v as i64)
        })
    }

    fn flag(&self, i: usize) -> Option<bool> {
        let token = self.tokens.get(i)?;
        match token.to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            t => t.parse::<f64>().ok().map(|v| v != 0.0),
        }
    }

    fn nums<const N: usize>(&self, start: usize) -> Option<[f64; N]> {
        let mut out = [0.0; N];
        for (k, v) in out.iter_mut().enumerate() {
            *v = self.num(start + k)?;
        }
        Some(out)
    }

    fn labels<const N: usize>(&self, start: usize) -> Option<[i64; N]> {
        let mut out = [0; N];
        for (k, v) in out.iter_mut().enumerate() {
            *v = self.label(start + k)?;
        }
        Some(out)
    }

    /// Optional label at `i`; a missing token is `Some(None)`, a bad one is `None`
    fn optional_label(&self, i: usize) -> Option<Option<i64>> {
        if i < self.len() {
            self.label(i).map(Some)
        } else {
            Some(None)
        }
    }
}

/// Read a model file
pub fn read_file<P: AsRef<Path>>(path: P) -> FemResult<FemDataModel> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let model = read_from(BufReader::new(file))?;
    info!("Read model from {}", path.display());
    Ok(model)
}

/// Read a model from a buffered reader
pub fn read_from<R: BufRead>(reader: R) -> FemResult<FemDataModel> {
    let mut model = FemDataModel::new();
    for line in reader.lines() {
        parse_line(&mut model, &line?);
    }
    Ok(model)
}

/// Read a model from text. The model is populated but not initialized.
pub fn read_model(input: &str) -> FemResult<FemDataModel> {
    let mut model = FemDataModel::new();
    parse_into(&mut model, input);
    Ok(model)
}

/// Append the records of `input` to an existing model; returns the number of lines used
pub fn parse_into(model: &mut FemDataModel, input: &str) -> usize {
    input.lines().filter(|line| parse_line(model, line)).count()
}

fn parse_line(model: &mut FemDataModel, line: &str) -> bool {
    let record = Record::new(line);
    let Some(keyword) = record.tokens.first().map(|k| k.to_ascii_lowercase()) else {
        return false;
    };

    let parsed = match keyword.as_str() {
        "material" => parse_material(model, &record),
        "node" => parse_node(model, &record),
        "hexaelement1" => parse_hexa(model, &record),
        "quadelement1" => parse_quad(model, &record),
        "triaelement1" => parse_tria(model, &record),
        "shellparameter" => parse_shell_parameter(model, &record),
        "coordinates" => parse_coordinates(model, &record),
        "restraint" => parse_restraint(model, &record),
        "load" => parse_load(model, &record),
        "resulttype" => parse_result_type(model, &record),
        "eigenvalue" => None,
        other => match Quantity::from_keyword(other) {
            Some(quantity) => parse_result_record(model, &record, quantity),
            None => None,
        },
    };

    if parsed.is_none() {
        debug!("Skipped line: {}", line.trim());
    }
    parsed.is_some()
}

fn parse_material(model: &mut FemDataModel, r: &Record) -> Option<()> {
    // Field 4 is unused
    if r.len() < 8 {
        return None;
    }
    let material = Material::new(r.label(1)?, r.num(2)?, r.num(3)?, r.num(5)?, r.num(6)?, r.num(7)?);
    model.add_material(material);
    Some(())
}

fn parse_node(model: &mut FemDataModel, r: &Record) -> Option<()> {
    let [x, y, z] = r.nums::<3>(2)?;
    model.add_node(Node::new(r.label(1)?, x, y, z));
    Some(())
}

fn parse_hexa(model: &mut FemDataModel, r: &Record) -> Option<()> {
    let nodes = r.labels::<8>(3)?;
    model.add_element(Element::hexa(r.label(1)?, r.label(2)?, nodes));
    Some(())
}

fn parse_quad(model: &mut FemDataModel, r: &Record) -> Option<()> {
    let nodes = r.labels::<4>(4)?;
    model.add_element(Element::quad(r.label(1)?, r.label(2)?, r.label(3)?, nodes));
    Some(())
}

fn parse_tria(model: &mut FemDataModel, r: &Record) -> Option<()> {
    let nodes = r.labels::<3>(4)?;
    model.add_element(Element::tria(r.label(1)?, r.label(2)?, r.label(3)?, nodes));
    Some(())
}

fn parse_shell_parameter(model: &mut FemDataModel, r: &Record) -> Option<()> {
    model.add_shell_parameter(ShellParameter::new(r.label(1)?, r.num(2)?));
    Some(())
}

fn parse_coordinates(model: &mut FemDataModel, r: &Record) -> Option<()> {
    let [n11, n12, n13, n21, n22, n23, n31, n32, n33] = r.nums::<9>(2)?;
    model.add_coordinates(CoordinateFrame::new(
        r.label(1)?,
        n11, n12, n13,
        n21, n22, n23,
        n31, n32, n33,
    ));
    Some(())
}

/// `restraint node (flag value)x3 [coords]` or `restraint node (flag value)x6 [coords]`
fn parse_restraint(model: &mut FemDataModel, r: &Record) -> Option<()> {
    if r.len() < 8 {
        return None;
    }
    let pairs = if r.len() >= 14 { 6 } else { 3 };
    let coords = r.optional_label(2 + 2 * pairs)?;

    let mut rest = [false; 6];
    let mut values = [0.0; 6];
    for c in 0..pairs {
        rest[c] = r.flag(2 + 2 * c)?;
        values[c] = r.num(3 + 2 * c)?;
    }

    let node = r.label(1)?;
    match Restraint::new(node, rest, values) {
        Some(mut restraint) => {
            restraint.coords_label = coords;
            model.add_restraint(restraint);
        }
        None => debug!("Dropped restraint at node {} with no fixed component", node),
    }
    Some(())
}

/// `load node [coords] fx fy fz [mx my mz]`
fn parse_load(model: &mut FemDataModel, r: &Record) -> Option<()> {
    let node = r.label(1)?;
    let (coords, values) = match r.len() {
        n if n >= 9 => (Some(r.label(2)?), r.nums::<6>(3)?),
        8 => (None, r.nums::<6>(2)?),
        6 | 7 => {
            let [x, y, z] = r.nums::<3>(3)?;
            (Some(r.label(2)?), [x, y, z, 0.0, 0.0, 0.0])
        }
        5 => {
            let [x, y, z] = r.nums::<3>(2)?;
            (None, [x, y, z, 0.0, 0.0, 0.0])
        }
        _ => return None,
    };

    let mut load = Load::new(node, values);
    load.coords_label = coords;
    model.add_load(load);
    Some(())
}

fn parse_result_type(model: &mut FemDataModel, r: &Record) -> Option<()> {
    let result_type = ResultType::parse(r.tokens.get(1)?)?;
    model.set_result_type(result_type);
    Some(())
}

fn parse_result_record(model: &mut FemDataModel, r: &Record, quantity: Quantity) -> Option<()> {
    if r.len() < 3 {
        return None;
    }
    let values = (2..r.len()).map(|i| r.num(i)).collect::<Option<Vec<f64>>>()?;
    model.add_result_record(ResultRecord {
        quantity,
        label: r.label(1)?,
        values,
    });
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ElementKind;
    use crate::model::ModelState;
    use approx::assert_relative_eq;

    const CUBE: &str = "\
MATERIAL 3 1000 0.25 0 2.5 1 1
node 10 0 0 0
node 11 1 0 0
node 12 1 1 0
node 13 0 1 0
node 14 0 0 1
node 15 1 0 1
node 16 1 1 1
node 17 0 1 1
HexaElement1 1 3 10 11 12 13 14 15 16 17
";

    #[test]
    fn test_read_nodes_elements_materials() {
        let mut model = read_model(CUBE).unwrap();
        assert_eq!(model.state(), ModelState::Populated);
        model.init().unwrap();

        assert_eq!(model.mesh.nodes.len(), 8);
        let element = &model.mesh.elements[0];
        assert_eq!(element.kind, ElementKind::Hexa8);
        assert_eq!(element.material(), 0);
        assert_eq!(element.nodes()[0], 0);
        assert_relative_eq!(model.materials[0].density, 2.5);
        assert_relative_eq!(model.materials[0].g, 400.0);
    }

    #[test]
    fn test_short_and_bad_lines_are_skipped() {
        let mut model = FemDataModel::new();
        let used = parse_into(
            &mut model,
            "node 1 0 0\nnode 2 0 0 zero\n\n# comment\nhexaelement1 1 1 1 2 3\nnode 3 1 2 3\nload 3 1\n",
        );
        assert_eq!(used, 1);
        assert_eq!(model.mesh.nodes.len(), 1);
        assert_eq!(model.mesh.elements.len(), 0);
        assert!(model.bc.loads.is_empty());
    }

    #[test]
    fn test_restraint_forms() {
        let input = "\
restraint 1 1 0 1 0 1 0
restraint 2 1 0.5 0 0 1 0 1 0 1 0 1 0.1 7
restraint 3 1 0 0 0 0 0 4
restraint 4 0 0 0 0 0 0
restraint 5 0 0 1
";
        let model = read_model(input).unwrap();
        let rs = &model.bc.restraints;
        assert_eq!(rs.len(), 3);

        assert_eq!(rs[0].rest, [true, true, true, false, false, false]);
        assert_eq!(rs[0].coords_label, None);

        assert_eq!(rs[1].rest, [true, false, true, true, true, true]);
        assert_relative_eq!(rs[1].values[0], 0.5);
        assert_relative_eq!(rs[1].values[5], 0.1);
        assert_eq!(rs[1].coords_label, Some(7));

        assert_eq!(rs[2].rest, [true, false, false, false, false, false]);
        assert_eq!(rs[2].coords_label, Some(4));
    }

    #[test]
    fn test_load_forms() {
        let input = "\
load 1 0 0 -5
load 2 9 1 2 3
load 3 1 2 3 4 5 6
load 4 9 1 2 3 4 5 6
";
        let model = read_model(input).unwrap();
        let ls = &model.bc.loads;
        assert_eq!(ls.len(), 4);
        assert_eq!(ls[0].values, [0.0, 0.0, -5.0, 0.0, 0.0, 0.0]);
        assert_eq!(ls[0].coords_label, None);
        assert_eq!(ls[1].values, [1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        assert_eq!(ls[1].coords_label, Some(9));
        assert_eq!(ls[2].values, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(ls[2].coords_label, None);
        assert_eq!(ls[3].coords_label, Some(9));
        assert_eq!(ls[3].values[5], 6.0);
    }

    #[test]
    fn test_shell_keywords_and_frames() {
        let input = "\
shellparameter 2 0.1
coordinates 5 0 -1 0 1 0 0 0 0 1
quadelement1 1 1 2 1 2 3 4
triaelement1 2 1 2 2 5 3
";
        let model = read_model(input).unwrap();
        assert_relative_eq!(model.shell_params[0].thickness, 0.1);
        assert!(model.coordinates[0].is_orthonormal(1e-12));
        assert_relative_eq!(model.coordinates[0].matrix[(0, 1)], -1.0);
        assert_eq!(model.mesh.elements[0].kind, ElementKind::QuadShell4);
        assert_eq!(model.mesh.elements[1].param_label, Some(2));
        assert_eq!(model.mesh.elements[1].node_labels, vec![2, 5, 3]);
    }

    #[test]
    fn test_deferred_records_after_init() {
        let input = format!(
            "{CUBE}resulttype element\neigenvalue 1 12.5\ndisplacement 16 0.1 0.2 0.3\nstress1 1 1 2 3 0 0 0\n"
        );
        let mut model = read_model(&input).unwrap();
        assert_eq!(model.result_type, ResultType::Element);
        model.init().unwrap();

        assert!(model.is_solved());
        assert_relative_eq!(model.result.displacement[6].dz, 0.3);
        assert_relative_eq!(model.result.stress1[0].yy, 2.0);
    }
}
