use std::ffi::CString;
use std::num::NonZeroU32;
use std::process::ExitCode;

use glow::HasContext;
use glutin::config::ConfigTemplateBuilder;
use glutin::context::{ContextApi, ContextAttributesBuilder, GlProfile, Version};
use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin::surface::SwapInterval;
use glutin_winit::{DisplayBuilder, GlWindow};
use log::{error, info, warn};
use raw_window_handle::HasRawWindowHandle;
use thiserror::Error;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use tri_glow::drawer_vtx2xyzrgb::{Drawer, Vertex};
use tri_glow::shader::ShaderError;

const TRIANGLE: [Vertex; 3] = [
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0],
    },
    Vertex {
        position: [0.0, 0.87, 0.0],
        color: [1.0, 0.0, 0.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0],
    },
];

const CLEAR_COLOR: [f32; 4] = [0.106, 0.118, 0.169, 1.0];

struct WindowConfig {
    title: &'static str,
    width: u32,
    height: u32,
    vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "OpenGL Triangle",
            width: 800,
            height: 600,
            vsync: true,
        }
    }
}

#[derive(Debug, Error)]
enum AppError {
    #[error("window creation failed: {0}")]
    WindowCreation(String),
    #[error("graphics loader failed: {0}")]
    GraphicsLoader(String),
    #[error(transparent)]
    ShaderBuild(#[from] ShaderError),
}

impl AppError {
    fn exit_code(&self) -> u8 {
        match self {
            AppError::WindowCreation(_) => 1,
            AppError::GraphicsLoader(_) => 2,
            AppError::ShaderBuild(_) => 3,
        }
    }
}

impl From<winit::error::EventLoopError> for AppError {
    fn from(err: winit::error::EventLoopError) -> Self {
        AppError::WindowCreation(err.to_string())
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(WindowConfig::default()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(config: WindowConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;

    let window_builder = WindowBuilder::new()
        .with_title(config.title)
        .with_inner_size(LogicalSize::new(config.width, config.height));

    let template = ConfigTemplateBuilder::new();
    let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));

    let (window, gl_config) = display_builder
        .build(&event_loop, template, |configs| {
            configs
                .reduce(|accum, config| {
                    if config.num_samples() > accum.num_samples() {
                        config
                    } else {
                        accum
                    }
                })
                .unwrap()
        })
        .map_err(|err| AppError::WindowCreation(err.to_string()))?;

    let window = window.ok_or_else(|| {
        AppError::WindowCreation("display builder produced no window".to_string())
    })?;
    let raw_window_handle = window.raw_window_handle();

    let gl_display = gl_config.display();
    let context_attributes = ContextAttributesBuilder::new()
        .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
        .with_profile(GlProfile::Core)
        .build(Some(raw_window_handle));

    let gl_context = unsafe {
        gl_display
            .create_context(&gl_config, &context_attributes)
            .map_err(|err| AppError::GraphicsLoader(err.to_string()))?
    };

    let attrs = window.build_surface_attributes(<_>::default());
    let gl_surface = unsafe {
        gl_display
            .create_window_surface(&gl_config, &attrs)
            .map_err(|err| AppError::GraphicsLoader(err.to_string()))?
    };

    let gl_context = gl_context
        .make_current(&gl_surface)
        .map_err(|err| AppError::GraphicsLoader(err.to_string()))?;

    if config.vsync {
        if let Err(err) =
            gl_surface.set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
        {
            warn!("vsync unavailable: {err}");
        }
    }

    let gl = unsafe {
        glow::Context::from_loader_function(|symbol| {
            let symbol = CString::new(symbol).unwrap();
            gl_display.get_proc_address(symbol.as_c_str()) as *const _
        })
    };
    let gl_version = unsafe { gl.get_parameter_string(glow::VERSION) };
    info!(
        "OpenGL {} context up, {} samples",
        gl_version,
        gl_config.num_samples()
    );

    let mut drawer = Drawer::new();
    drawer.compile_shader(&gl)?;
    drawer.set_vtx2xyzrgb(&gl, &TRIANGLE);

    let size = window.inner_size();
    unsafe {
        gl.viewport(0, 0, size.width as i32, size.height as i32);
        gl.clear_color(
            CLEAR_COLOR[0],
            CLEAR_COLOR[1],
            CLEAR_COLOR[2],
            CLEAR_COLOR[3],
        );
    }

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                drawer.destroy(&gl);
                elwt.exit();
            }
            WindowEvent::Resized(size) => {
                // skip zero-sized resizes from minimization
                if let (Some(width), Some(height)) =
                    (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                {
                    gl_surface.resize(&gl_context, width, height);
                    unsafe {
                        gl.viewport(0, 0, size.width as i32, size.height as i32);
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                unsafe {
                    gl.clear(glow::COLOR_BUFFER_BIT);
                }
                drawer.draw(&gl);
                if let Err(err) = gl_surface.swap_buffers(&gl_context) {
                    error!("swap buffers failed: {err}");
                    drawer.destroy(&gl);
                    elwt.exit();
                }
            }
            _ => (),
        },
        Event::AboutToWait => {
            window.request_redraw();
        }
        _ => (),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_nonzero_and_distinct() {
        let errors = [
            AppError::WindowCreation(String::new()),
            AppError::GraphicsLoader(String::new()),
            AppError::ShaderBuild(ShaderError::Link { log: String::new() }),
        ];
        let codes: Vec<u8> = errors.iter().map(AppError::exit_code).collect();
        for (i, a) in codes.iter().enumerate() {
            assert_ne!(*a, 0);
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn shader_failure_keeps_the_driver_report() {
        let err = AppError::from(ShaderError::Compile {
            stage: tri_glow::shader::StageKind::Vertex,
            log: "0:1(1): error: syntax error".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "ERROR::SHADER::VERTEX::COMPILATION_FAILED\n0:1(1): error: syntax error"
        );
    }

    #[test]
    fn triangle_is_three_vertices_covering_the_original_extents() {
        assert_eq!(TRIANGLE.len(), 3);
        assert_eq!(TRIANGLE[1].position, [0.0, 0.87, 0.0]);
        // one full-intensity channel per vertex
        for vertex in &TRIANGLE {
            assert_eq!(vertex.color.iter().sum::<f32>(), 1.0);
        }
    }
}
