//! draw a vertex-colored triangle list. xyz position and rgb color are
//! interleaved per vertex

use glow::HasContext;

use crate::shader::{ShaderError, ShaderProgram};

pub const VERTEX_SRC: &str = r#"#version 330 core
layout (location = 0) in vec3 aPos;
layout (location = 1) in vec3 aCol;
out vec3 vertexColor;
void main() {
    gl_Position = vec4(aPos, 1.0);
    vertexColor = aCol;
}
"#;

pub const FRAGMENT_SRC: &str = r#"#version 330 core
out vec4 FragColor;
in vec3 vertexColor;
void main() {
    FragColor = vec4(vertexColor, 1.0);
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

pub struct Drawer {
    pub program: Option<ShaderProgram>,
    pub mode: u32,
    vao: Option<glow::NativeVertexArray>,
    vbo: Option<glow::NativeBuffer>,
    num_vtx: i32,
}

impl Default for Drawer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drawer {
    pub fn new() -> Self {
        Drawer {
            program: None,
            mode: glow::TRIANGLES,
            vao: None,
            vbo: None,
            num_vtx: 0,
        }
    }

    pub fn compile_shader(&mut self, gl: &glow::Context) -> Result<(), ShaderError> {
        self.program = Some(crate::build_program(gl, VERTEX_SRC, FRAGMENT_SRC)?);
        Ok(())
    }

    /// Uploads the vertices once; the geometry is never mutated afterwards.
    pub fn set_vtx2xyzrgb(&mut self, gl: &glow::Context, vtx2xyzrgb: &[Vertex]) {
        let stride = std::mem::size_of::<Vertex>() as i32;
        unsafe {
            let vbo = gl.create_buffer().expect("Cannot create buffer");
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vtx2xyzrgb),
                glow::STATIC_DRAW,
            );
            self.vbo = Some(vbo);

            let vao = gl.create_vertex_array().expect("Cannot create vertex array");
            gl.bind_vertex_array(Some(vao));
            // locations match the layout qualifiers in VERTEX_SRC
            gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
            gl.enable_vertex_attrib_array(0);
            gl.vertex_attrib_pointer_f32(
                1,
                3,
                glow::FLOAT,
                false,
                stride,
                3 * std::mem::size_of::<f32>() as i32,
            );
            gl.enable_vertex_attrib_array(1);
            self.vao = Some(vao);
        }
        self.num_vtx = vtx2xyzrgb.len() as i32;
    }

    pub fn draw(&self, gl: &glow::Context) {
        unsafe {
            gl.use_program(self.program.map(ShaderProgram::raw));
            gl.bind_vertex_array(self.vao);
            gl.draw_arrays(self.mode, 0, self.num_vtx);
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            if let Some(program) = self.program.take() {
                program.destroy(gl);
            }
            if let Some(vao) = self.vao.take() {
                gl.delete_vertex_array(vao);
            }
            if let Some(vbo) = self.vbo.take() {
                gl.delete_buffer(vbo);
            }
        }
        self.num_vtx = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_six_tightly_packed_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 6 * std::mem::size_of::<f32>());
        assert_eq!(std::mem::align_of::<Vertex>(), std::mem::align_of::<f32>());
    }

    #[test]
    fn vertices_cast_to_interleaved_float_slice() {
        let vtx = [
            Vertex {
                position: [-0.5, -0.5, 0.0],
                color: [0.0, 1.0, 0.0],
            },
            Vertex {
                position: [0.0, 0.87, 0.0],
                color: [1.0, 0.0, 0.0],
            },
        ];
        let floats: &[f32] = bytemuck::cast_slice(&vtx);
        assert_eq!(
            floats,
            &[-0.5, -0.5, 0.0, 0.0, 1.0, 0.0, 0.0, 0.87, 0.0, 1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn stage_interface_variables_match() {
        // the fragment stage reads exactly what the vertex stage writes
        assert!(VERTEX_SRC.contains("out vec3 vertexColor;"));
        assert!(FRAGMENT_SRC.contains("in vec3 vertexColor;"));
    }
}
