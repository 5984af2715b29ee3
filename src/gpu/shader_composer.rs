use std::borrow::Cow;
use std::collections::HashMap;

use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor,
    ShaderDefValue, ShaderLanguage, ShaderType,
};

use crate::error::EngineError;
use crate::resource::PixelEncoding;

/// Wraps `naga_oil::compose::Composer` to provide shader composition with
/// `#import` support.
///
/// Pre-loads the shared WGSL modules at construction time. Kernel shaders
/// use `#import kettex::amplitude::{...}` to pull in the bindings and the
/// texel codec. The `BYTE_ENCODING` shader def selects the fixed-point
/// codec; the composer produces `naga::Module` IR directly, skipping WGSL
/// re-parse at runtime.
pub struct ShaderComposer {
    composer: Composer,
}

/// Shared module definition: (source, file_path)
struct ModuleDef {
    source: &'static str,
    file_path: &'static str,
}

impl ShaderComposer {
    /// Register the shared modules.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Shader`] if a shared module fails to parse.
    pub fn new() -> Result<Self, EngineError> {
        let mut composer = Composer::default();

        // Dependency order: modules with no imports first.
        let modules: &[ModuleDef] = &[
            ModuleDef {
                source: include_str!(
                    "../../assets/shaders/modules/fullscreen.wgsl"
                ),
                file_path: "modules/fullscreen.wgsl",
            },
            ModuleDef {
                source: include_str!(
                    "../../assets/shaders/modules/amplitude.wgsl"
                ),
                file_path: "modules/amplitude.wgsl",
            },
        ];

        for m in modules {
            let _ = composer
                .add_composable_module(ComposableModuleDescriptor {
                    source: m.source,
                    file_path: m.file_path,
                    language: ShaderLanguage::Wgsl,
                    ..Default::default()
                })
                .map_err(|e| {
                    EngineError::Shader(format!(
                        "failed to register shader module '{}': {e:?}",
                        m.file_path
                    ))
                })?;
        }

        Ok(Self { composer })
    }

    /// Compose a shader source string (which may contain `#import`
    /// directives) for `encoding` into a `wgpu::ShaderModule`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Shader`] if composition fails.
    pub fn compose(
        &mut self,
        device: &wgpu::Device,
        label: &str,
        source: &str,
        file_path: &str,
        encoding: PixelEncoding,
    ) -> Result<wgpu::ShaderModule, EngineError> {
        let naga_module = self.compose_naga(source, file_path, encoding)?;
        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Naga(Cow::Owned(naga_module)),
        }))
    }

    /// Compose a shader source into a `naga::Module` without creating a wgpu
    /// shader module. Useful for testing shader composition without a GPU
    /// device.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Shader`] if composition fails.
    pub fn compose_naga(
        &mut self,
        source: &str,
        file_path: &str,
        encoding: PixelEncoding,
    ) -> Result<naga::Module, EngineError> {
        self.composer
            .make_naga_module(NagaModuleDescriptor {
                source,
                file_path,
                shader_type: ShaderType::Wgsl,
                shader_defs: shader_defs(encoding),
                ..Default::default()
            })
            .map_err(|e| {
                EngineError::Shader(format!(
                    "failed to compose shader '{file_path}': {e}"
                ))
            })
    }
}

fn shader_defs(encoding: PixelEncoding) -> HashMap<String, ShaderDefValue> {
    let mut defs = HashMap::new();
    if encoding == PixelEncoding::Byte {
        let _ = defs.insert("BYTE_ENCODING".to_owned(), ShaderDefValue::Bool(true));
    }
    defs
}
