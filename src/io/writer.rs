//! Model and result record writer

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::analysis::ResultType;
use crate::error::{FemError, FemResult};
use crate::math::SymmetricTensor3;
use crate::model::FemDataModel;
use crate::results::Quantity;

/// Writes a model in the text format read by [`read_model`](super::read_model)
pub struct ModelWriter<W: Write> {
    out: W,
}

impl<W: Write> ModelWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Materials, shell parameters, frames, nodes, elements, restraints and loads
    pub fn write_definition(&mut self, model: &FemDataModel) -> FemResult<()> {
        let out = &mut self.out;
        for m in &model.materials {
            writeln!(
                out,
                "material {} {} {} 0 {} {} {}",
                m.label, m.e, m.nu, m.density, m.conductivity, m.specific_heat
            )?;
        }
        for p in &model.shell_params {
            writeln!(out, "shellparameter {} {}", p.label, p.thickness)?;
        }
        for c in &model.coordinates {
            let m = &c.matrix;
            write!(out, "coordinates {}", c.label)?;
            for i in 0..3 {
                for j in 0..3 {
                    write!(out, " {}", m[(i, j)])?;
                }
            }
            writeln!(out)?;
        }
        for n in &model.mesh.nodes {
            writeln!(out, "node {} {} {} {}", n.label, n.x, n.y, n.z)?;
        }
        for e in &model.mesh.elements {
            write!(out, "{} {} {}", e.kind.keyword(), e.label, e.material_label)?;
            if let Some(p) = e.param_label {
                write!(out, " {}", p)?;
            }
            for n in &e.node_labels {
                write!(out, " {}", n)?;
            }
            writeln!(out)?;
        }
        for r in &model.bc.restraints {
            write!(out, "restraint {}", r.node_label)?;
            for c in 0..6 {
                write!(out, " {} {}", u8::from(r.rest[c]), r.values[c])?;
            }
            if let Some(c) = r.coords_label {
                write!(out, " {}", c)?;
            }
            writeln!(out)?;
        }
        for l in &model.bc.loads {
            write!(out, "load {}", l.node_label)?;
            if let Some(c) = l.coords_label {
                write!(out, " {}", c)?;
            }
            for v in &l.values {
                write!(out, " {}", v)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Result records of a solved model, addressed by node or element label
    pub fn write_results(&mut self, model: &FemDataModel) -> FemResult<()> {
        let result = &model.result;
        if !result.has_displacement() {
            return Err(FemError::NotAnalyzed);
        }
        let out = &mut self.out;
        writeln!(out, "resulttype {}", result.result_type.as_str())?;

        let node_labels: Vec<i64> = model.mesh.nodes.iter().map(|n| n.label).collect();
        for (label, d) in node_labels.iter().zip(&result.displacement) {
            write!(out, "{} {}", Quantity::Displacement.keyword(), label)?;
            for v in d.as_array() {
                write!(out, " {}", v)?;
            }
            writeln!(out)?;
        }

        let field_labels: Vec<i64> = match result.result_type {
            ResultType::Node => node_labels.clone(),
            ResultType::Element => model.mesh.elements.iter().map(|e| e.label).collect(),
        };
        let tensors: [(Quantity, &[SymmetricTensor3]); 4] = [
            (Quantity::Strain1, result.strain1.as_slice()),
            (Quantity::Stress1, result.stress1.as_slice()),
            (Quantity::Strain2, result.strain2.as_slice()),
            (Quantity::Stress2, result.stress2.as_slice()),
        ];
        for (quantity, field) in tensors {
            for (label, t) in field_labels.iter().zip(field) {
                writeln!(
                    out,
                    "{} {} {} {} {} {} {} {}",
                    quantity.keyword(),
                    label,
                    t.xx,
                    t.yy,
                    t.zz,
                    t.xy,
                    t.yz,
                    t.zx
                )?;
            }
        }
        let scalars: [(Quantity, &[f64], &[i64]); 3] = [
            (Quantity::Energy1, result.s_energy1.as_slice(), field_labels.as_slice()),
            (Quantity::Energy2, result.s_energy2.as_slice(), field_labels.as_slice()),
            (Quantity::Temperature, result.temperature.as_slice(), node_labels.as_slice()),
        ];
        for (quantity, field, labels) in scalars {
            for (label, v) in labels.iter().zip(field) {
                writeln!(out, "{} {} {}", quantity.keyword(), label, v)?;
            }
        }
        Ok(())
    }
}

/// Write the model definition, followed by its results when solved
pub fn write_model<W: Write>(model: &FemDataModel, out: W) -> FemResult<W> {
    let mut writer = ModelWriter::new(out);
    writer.write_definition(model)?;
    if model.result.has_displacement() {
        writer.write_results(model)?;
    }
    Ok(writer.into_inner())
}

/// Write only the result records of a solved model
pub fn write_results<W: Write>(model: &FemDataModel, out: W) -> FemResult<W> {
    let mut writer = ModelWriter::new(out);
    writer.write_results(model)?;
    Ok(writer.into_inner())
}

/// Write a model and its results to a file
pub fn write_file<P: AsRef<Path>>(model: &FemDataModel, path: P) -> FemResult<()> {
    let path = path.as_ref();
    let mut out = write_model(model, BufWriter::new(File::create(path)?))?;
    out.flush()?;
    info!("Wrote model to {}", path.display());
    Ok(())
}
