// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `piet-material-glow`.
//
// `piet-material-glow` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `piet-material-glow` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `piet-material-glow`. If not, see <https://www.gnu.org/licenses/>.

// Sets up a window and a current OpenGL context for the examples.

pub(crate) fn init() {
    tracing_subscriber::fmt::init();
}

pub(crate) mod glutin_impl {
    use piet_material_glow::GlContext;

    use glutin::config::{Config, ConfigTemplateBuilder};
    use glutin::context::{
        ContextApi, ContextAttributesBuilder, NotCurrentContext, PossiblyCurrentContext, Version,
    };
    use glutin::display::{Display, GetGlDisplay};
    use glutin::prelude::*;

    use glutin::surface::{Surface, SwapInterval, WindowSurface};
    use glutin_winit::{DisplayBuilder, GlWindow};

    use raw_window_handle::HasRawWindowHandle;

    use std::error::Error;
    use std::mem;
    use std::num::NonZeroU32;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use winit::event::{Event, WindowEvent};
    use winit::event_loop::{EventLoop, EventLoopWindowTarget};
    use winit::window::{Window, WindowBuilder};

    pub(crate) type Context = Rc<GlContext<glow::Context>>;

    struct GlutinSetup {
        display: Display,
        config: Config,
        context: ContextType,
        window: Option<Window>,
    }

    #[derive(Default)]
    enum ContextType {
        NotCurrent(NotCurrentContext),
        Current {
            context: PossiblyCurrentContext,
            window: Window,
            surface: Surface<WindowSurface>,
        },
        #[default]
        Hole,
    }

    fn make_window_builder() -> WindowBuilder {
        WindowBuilder::new().with_title("piet-material-glow example")
    }

    impl GlutinSetup {
        fn new<T>(event_loop: &EventLoopWindowTarget<T>) -> Result<Self, Box<dyn Error>> {
            let window = if cfg!(windows) {
                Some(make_window_builder())
            } else {
                None
            };

            let display = DisplayBuilder::new().with_window_builder(window);

            // Prefer the config with the most samples.
            let (window, gl_config) =
                display.build(event_loop, ConfigTemplateBuilder::new(), |configs| {
                    configs
                        .reduce(|accum, config| {
                            if config.num_samples() > accum.num_samples() {
                                config
                            } else {
                                accum
                            }
                        })
                        .unwrap()
                })?;

            tracing::info!("using config {:?}", &gl_config);

            let window_handle = window.as_ref().map(|w| w.raw_window_handle());
            let contexts = [
                ContextAttributesBuilder::new().build(window_handle),
                ContextAttributesBuilder::new()
                    .with_context_api(ContextApi::Gles(None))
                    .build(window_handle),
                ContextAttributesBuilder::new()
                    .with_context_api(ContextApi::Gles(Some(Version::new(2, 0))))
                    .build(window_handle),
            ];

            let display = gl_config.display();
            let gl_handler = (|| {
                for context in &contexts {
                    if let Ok(gl_context) = unsafe { display.create_context(&gl_config, context) } {
                        return Ok(gl_context);
                    }
                }

                Err(Box::<dyn std::error::Error>::from(
                    "Could not create a context",
                ))
            })()?;

            Ok(Self {
                display,
                config: gl_config,
                context: ContextType::NotCurrent(gl_handler),
                window,
            })
        }

        fn make_current<T>(&mut self, window_target: &EventLoopWindowTarget<T>) -> Context {
            let window = self.window.take().unwrap_or_else(|| {
                let window_builder = make_window_builder();
                glutin_winit::finalize_window(window_target, window_builder, &self.config).unwrap()
            });

            let attrs = window.build_surface_attributes(<_>::default());
            let gl_surface = unsafe {
                self.display
                    .create_window_surface(&self.config, &attrs)
                    .unwrap()
            };

            let gl_context = match mem::take(&mut self.context) {
                ContextType::NotCurrent(context) => context.make_current(&gl_surface).unwrap(),
                _ => panic!("Invalid state!"),
            };

            if let Err(res) = gl_surface
                .set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::new(1).unwrap()))
            {
                tracing::warn!("Error setting vsync: {res:?}");
            }

            self.context = ContextType::Current {
                context: gl_context,
                window,
                surface: gl_surface,
            };

            let glow_context = unsafe {
                glow::Context::from_loader_function_cstr(|s| {
                    self.display.get_proc_address(s) as *const _
                })
            };

            // SAFETY: The context was just made current on this thread.
            Rc::new(unsafe { GlContext::new(glow_context) })
        }
    }

    /// Run `setup` once the context is current, then `frame` every frame until the window
    /// is closed.
    pub(crate) fn with_renderer<S: 'static>(
        setup: impl FnOnce(&Context) -> Result<S, Box<dyn Error>> + 'static,
        mut frame: impl FnMut(&Context, &mut S, u32, u32) + 'static,
    ) -> Result<(), Box<dyn Error>> {
        let event_loop = EventLoop::new();
        let mut setup_state = GlutinSetup::new(&event_loop)?;

        let mut setup = Some(setup);
        let mut renderer: Option<(Context, S)> = None;
        let mut current_size = None;
        let mut next_render = Instant::now() + Duration::from_millis(16);

        event_loop.run(move |event, window_target, control_flow| {
            control_flow.set_wait_until(next_render);
            match event {
                Event::Resumed => {
                    let context = setup_state.make_current(window_target);
                    if let Some(setup) = setup.take() {
                        match setup(&context) {
                            Ok(state) => renderer = Some((context, state)),
                            Err(err) => {
                                tracing::error!("setup failed: {err}");
                                control_flow.set_exit();
                            }
                        }
                    }
                }
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::Resized(size) => {
                        if size.width != 0 && size.height != 0 {
                            if let ContextType::Current {
                                context, surface, ..
                            } = &setup_state.context
                            {
                                surface.resize(
                                    context,
                                    NonZeroU32::new(size.width).unwrap(),
                                    NonZeroU32::new(size.height).unwrap(),
                                );
                                current_size = Some(size);
                            }
                        }
                    }
                    WindowEvent::CloseRequested => {
                        // Release GPU objects while the context is still current.
                        renderer = None;
                        control_flow.set_exit();
                    }
                    _ => (),
                },
                Event::RedrawEventsCleared => {
                    if let (
                        ContextType::Current {
                            context: gl_context,
                            window,
                            surface: gl_surface,
                        },
                        Some((context, state)),
                    ) = (&setup_state.context, renderer.as_mut())
                    {
                        let size = current_size.unwrap_or_else(|| window.inner_size());
                        frame(context, state, size.width, size.height);

                        window.request_redraw();

                        gl_surface.swap_buffers(gl_context).unwrap();
                        next_render += Duration::from_millis(17);
                    }
                }
                _ => (),
            }
        })
    }
}

pub(crate) use glutin_impl::{with_renderer, Context};
