pub mod drawer_vtx2xyzrgb;
pub mod shader;

use shader::{ShaderError, ShaderProgram, ShaderSource};

/// Compiles a vertex/fragment source pair and links them into a program.
///
/// Stage objects live only for the duration of the attempt: a stage that
/// compiled before the other one failed is released here, and [`shader::link`]
/// consumes both stages whatever the link outcome.
pub fn build_program(
    gl: &glow::Context,
    vertex_shader_source: &str,
    fragment_shader_source: &str,
) -> Result<ShaderProgram, ShaderError> {
    let vertex = shader::compile_stage(gl, ShaderSource::vertex(vertex_shader_source))?;
    let fragment = match shader::compile_stage(gl, ShaderSource::fragment(fragment_shader_source)) {
        Ok(fragment) => fragment,
        Err(err) => {
            vertex.release(gl);
            return Err(err);
        }
    };
    shader::link(gl, vertex, fragment)
}
