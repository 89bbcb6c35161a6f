//! Top-level generation run.

use super::controller::ControllerGenerator;
use super::reference::ReferenceTypeCollector;
use super::Metadata;
use crate::config::{Config, Settings};
use crate::syntax::Program;
use crate::Result;

/// Runs the whole pipeline over one declaration tree.
pub struct MetadataGenerator<'a> {
    program: &'a Program,
    settings: Settings,
}

impl<'a> MetadataGenerator<'a> {
    /// # Errors
    ///
    /// Fails when the configuration does not compile (bad pattern, unknown
    /// primitive type name).
    pub fn new(program: &'a Program, config: &Config) -> Result<Self> {
        Ok(Self {
            program,
            settings: config.settings()?,
        })
    }

    /// Controllers for every exported class exposing at least one method,
    /// in input order, plus the models they reference.
    pub fn generate(&self) -> Result<Metadata> {
        let mut controllers = Vec::new();
        for file in &self.program.files {
            for class in file.classes.iter().filter(|c| c.exported) {
                let generator = ControllerGenerator::new(self.program, &self.settings, file, class);
                if !generator.is_valid() {
                    continue;
                }
                let controller = generator.generate()?;
                if controller.methods.is_empty() {
                    log::debug!("Skipping '{}': no operations", controller.name);
                    continue;
                }
                controllers.push(controller);
            }
        }
        log::debug!("Generated {} controllers", controllers.len());

        let reference_types = ReferenceTypeCollector::new(self.program).collect(&controllers);
        Ok(Metadata {
            controllers,
            reference_types,
        })
    }
}
