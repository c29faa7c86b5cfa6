//! Shader-program build protocol: compile two stages, link them into a
//! program, surface driver diagnostics on failure.

use glow::HasContext;
use thiserror::Error;

/// Driver diagnostic logs longer than this are truncated.
pub const MAX_LOG_LEN: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Vertex => "VERTEX",
            StageKind::Fragment => "FRAGMENT",
        }
    }

    fn gl_type(self) -> u32 {
        match self {
            StageKind::Vertex => glow::VERTEX_SHADER,
            StageKind::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("ERROR::SHADER::{stage}::COMPILATION_FAILED\n{log}")]
    Compile { stage: StageKind, log: String },
    #[error("ERROR::SHADER::PROGRAM::LINKING_FAILED\n{log}")]
    Link { log: String },
    #[error("cannot create {stage} shader object: {reason}")]
    CreateStage { stage: StageKind, reason: String },
    #[error("cannot create program object: {reason}")]
    CreateProgram { reason: String },
}

/// Source text tagged with its stage kind.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    pub kind: StageKind,
    pub text: &'a str,
}

impl<'a> ShaderSource<'a> {
    pub fn vertex(text: &'a str) -> Self {
        Self {
            kind: StageKind::Vertex,
            text,
        }
    }

    pub fn fragment(text: &'a str) -> Self {
        Self {
            kind: StageKind::Fragment,
            text,
        }
    }
}

/// Compiled stage object, alive only between [`compile_stage`] and [`link`]
/// (or an explicit [`CompiledStage::release`] when the other stage fails).
#[derive(Debug)]
pub struct CompiledStage {
    kind: StageKind,
    raw: glow::NativeShader,
}

impl CompiledStage {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn release(self, gl: &glow::Context) {
        unsafe { gl.delete_shader(self.raw) };
    }
}

/// Linked program handle. Either fully linked and usable or never handed out.
#[derive(Debug, Clone, Copy)]
pub struct ShaderProgram {
    raw: glow::NativeProgram,
}

impl ShaderProgram {
    pub fn raw(self) -> glow::NativeProgram {
        self.raw
    }

    pub fn destroy(self, gl: &glow::Context) {
        unsafe { gl.delete_program(self.raw) };
    }
}

pub fn compile_stage(
    gl: &glow::Context,
    source: ShaderSource<'_>,
) -> Result<CompiledStage, ShaderError> {
    unsafe {
        let shader = gl
            .create_shader(source.kind.gl_type())
            .map_err(|reason| ShaderError::CreateStage {
                stage: source.kind,
                reason,
            })?;
        gl.shader_source(shader, source.text);
        gl.compile_shader(shader);
        if !gl.get_shader_compile_status(shader) {
            let log = truncate_log(gl.get_shader_info_log(shader));
            gl.delete_shader(shader);
            return Err(ShaderError::Compile {
                stage: source.kind,
                log,
            });
        }
        Ok(CompiledStage {
            kind: source.kind,
            raw: shader,
        })
    }
}

/// Links one vertex and one fragment stage into a program. Both stage
/// objects are detached and deleted whether or not linking succeeds.
pub fn link(
    gl: &glow::Context,
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<ShaderProgram, ShaderError> {
    debug_assert_eq!(vertex.kind(), StageKind::Vertex);
    debug_assert_eq!(fragment.kind(), StageKind::Fragment);
    unsafe {
        let program = match gl.create_program() {
            Ok(program) => program,
            Err(reason) => {
                gl.delete_shader(vertex.raw);
                gl.delete_shader(fragment.raw);
                return Err(ShaderError::CreateProgram { reason });
            }
        };
        gl.attach_shader(program, vertex.raw);
        gl.attach_shader(program, fragment.raw);
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        let log = if linked {
            String::new()
        } else {
            truncate_log(gl.get_program_info_log(program))
        };
        for stage in [vertex.raw, fragment.raw] {
            gl.detach_shader(program, stage);
            gl.delete_shader(stage);
        }
        if !linked {
            gl.delete_program(program);
            return Err(ShaderError::Link { log });
        }
        Ok(ShaderProgram { raw: program })
    }
}

fn truncate_log(mut log: String) -> String {
    if log.len() > MAX_LOG_LEN {
        let mut end = MAX_LOG_LEN;
        while !log.is_char_boundary(end) {
            end -= 1;
        }
        log.truncate(end);
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_labels_are_total() {
        assert_eq!(StageKind::Vertex.label(), "VERTEX");
        assert_eq!(StageKind::Fragment.label(), "FRAGMENT");
    }

    #[test]
    fn compile_error_display_matches_driver_report_format() {
        let err = ShaderError::Compile {
            stage: StageKind::Fragment,
            log: "0:3(1): error: syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ERROR::SHADER::FRAGMENT::COMPILATION_FAILED\n0:3(1): error: syntax error"
        );
    }

    #[test]
    fn link_error_display_matches_driver_report_format() {
        let err = ShaderError::Link {
            log: "error: vertex shader output `vertexColor' not read".to_string(),
        };
        assert!(err
            .to_string()
            .starts_with("ERROR::SHADER::PROGRAM::LINKING_FAILED\n"));
    }

    #[test]
    fn short_log_is_untouched() {
        let log = "a".repeat(MAX_LOG_LEN);
        assert_eq!(truncate_log(log.clone()), log);
    }

    #[test]
    fn long_log_is_truncated_to_bound() {
        let log = "b".repeat(MAX_LOG_LEN + 100);
        assert_eq!(truncate_log(log).len(), MAX_LOG_LEN);
    }

    #[test]
    fn truncation_respects_utf8_boundaries() {
        // 3-byte characters never line up with the 512-byte bound
        let log = "\u{20ac}".repeat(MAX_LOG_LEN);
        let truncated = truncate_log(log);
        assert!(truncated.len() <= MAX_LOG_LEN);
        assert!(truncated.is_char_boundary(truncated.len()));
    }

    #[test]
    fn source_constructors_tag_the_stage() {
        assert_eq!(ShaderSource::vertex("void main() {}").kind, StageKind::Vertex);
        assert_eq!(
            ShaderSource::fragment("void main() {}").kind,
            StageKind::Fragment
        );
    }
}
