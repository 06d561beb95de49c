// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `piet-material`.
//
// `piet-material` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `piet-material` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `piet-material`. If not, see <https://www.gnu.org/licenses/>.

//! A recording GPU context that behaves like a small GLSL driver.
//!
//! Compilation checks for a `#version` directive, a `main` function and balanced braces.
//! Linking matches varyings between stages and hands out locations for every uniform and
//! attribute that is used somewhere besides its declaration, like a driver that strips
//! inactive inputs.

#![allow(dead_code)]

use piet_material::{GpuContext, ShaderStage};

use std::cell::RefCell;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// A uniform location, tagged with the program that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MockUniform {
    pub program: u32,
    pub location: i32,
}

/// Every state-changing call made on the context, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateShader(u32, ShaderStage),
    CompileShader(u32, ShaderStage),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader(u32, u32),
    DetachShader(u32, u32),
    BindAttribLocation(u32, u32, String),
    LinkProgram(u32),
    DeleteProgram(u32),
    UseProgram(Option<u32>),
    UniformMatrix4(Option<MockUniform>, [f32; 16]),
    Uniform4(Option<MockUniform>, [f32; 4]),
    Uniform1(Option<MockUniform>, i32),
}

#[derive(Debug)]
pub struct MockError(&'static str);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl Error for MockError {}

struct Shader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct Program {
    attached: Vec<u32>,
    bindings: Vec<(u32, String)>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    attributes: HashMap<String, u32>,
}

#[derive(Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, Shader>,
    programs: HashMap<u32, Program>,
    current: Option<u32>,
    calls: Vec<Call>,
    lookups: usize,
    fail_allocations: bool,
}

impl State {
    fn allocate(&mut self) -> Result<u32, MockError> {
        if self.fail_allocations {
            return Err(MockError("out of object names"));
        }

        self.next_id += 1;
        Ok(self.next_id)
    }
}

#[derive(Default)]
pub struct MockContext {
    state: RefCell<State>,
}

impl MockContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// The stages compiled so far, in order.
    pub fn compiled_stages(&self) -> Vec<ShaderStage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CompileShader(_, stage) => Some(stage),
                _ => None,
            })
            .collect()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn current_program(&self) -> Option<u32> {
        self.state.borrow().current
    }

    /// The number of location queries that reached the driver.
    pub fn lookups(&self) -> usize {
        self.state.borrow().lookups
    }

    pub fn fail_allocations(&self, fail: bool) {
        self.state.borrow_mut().fail_allocations = fail;
    }

    fn record(&self, call: Call) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl GpuContext for MockContext {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = MockUniform;
    type Error = MockError;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, MockError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate()?;
        state.shaders.insert(
            id,
            Shader {
                stage,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        state.calls.push(Call::CreateShader(id, stage));
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut state = self.state.borrow_mut();
        let shader = state.shaders.get_mut(&shader).expect("no such shader");
        shader.source = source.to_string();
    }

    fn compile_shader(&self, shader: u32) {
        let stage = {
            let mut state = self.state.borrow_mut();
            let shader = state.shaders.get_mut(&shader).expect("no such shader");
            match check_syntax(&shader.source) {
                Ok(()) => {
                    shader.compiled = true;
                    shader.log.clear();
                }
                Err(log) => {
                    shader.compiled = false;
                    shader.log = log;
                }
            }
            shader.stage
        };

        self.record(Call::CompileShader(shader, stage));
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state.borrow().shaders[&shader].compiled
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.state.borrow().shaders[&shader].log.clone()
    }

    fn delete_shader(&self, shader: u32) {
        let removed = self.state.borrow_mut().shaders.remove(&shader);
        assert!(removed.is_some(), "shader {shader} deleted twice");
        self.record(Call::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<u32, MockError> {
        let mut state = self.state.borrow_mut();
        let id = state.allocate()?;
        state.programs.insert(id, Program::default());
        state.calls.push(Call::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        {
            let mut state = self.state.borrow_mut();
            assert!(state.shaders.contains_key(&shader), "attaching a dead shader");
            let program = state.programs.get_mut(&program).expect("no such program");
            program.attached.push(shader);
        }

        self.record(Call::AttachShader(program, shader));
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        {
            let mut state = self.state.borrow_mut();
            let program = state.programs.get_mut(&program).expect("no such program");
            program.attached.retain(|&attached| attached != shader);
        }

        self.record(Call::DetachShader(program, shader));
    }

    fn bind_attrib_location(&self, program: u32, slot: u32, name: &str) {
        {
            let mut state = self.state.borrow_mut();
            let program = state.programs.get_mut(&program).expect("no such program");
            program.bindings.retain(|(bound, _)| *bound != slot);
            program.bindings.push((slot, name.to_string()));
        }

        self.record(Call::BindAttribLocation(program, slot, name.to_string()));
    }

    fn link_program(&self, program: u32) {
        {
            let mut state = self.state.borrow_mut();
            let stages = state.programs[&program]
                .attached
                .iter()
                .map(|id| {
                    let shader = &state.shaders[id];
                    (shader.stage, shader.source.clone(), shader.compiled)
                })
                .collect::<Vec<_>>();
            let program = state.programs.get_mut(&program).expect("no such program");
            link(program, &stages);
        }

        self.record(Call::LinkProgram(program));
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state.borrow().programs[&program].linked
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state.borrow().programs[&program].log.clone()
    }

    fn delete_program(&self, program: u32) {
        {
            let mut state = self.state.borrow_mut();
            let removed = state.programs.remove(&program);
            assert!(removed.is_some(), "program {program} deleted twice");
            if state.current == Some(program) {
                state.current = None;
            }
        }

        self.record(Call::DeleteProgram(program));
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<MockUniform> {
        let mut state = self.state.borrow_mut();
        state.lookups += 1;

        let linked = &state.programs[&program];
        assert!(linked.linked, "querying an unlinked program");
        linked
            .uniforms
            .iter()
            .position(|uniform| uniform == name)
            .map(|location| MockUniform {
                program,
                location: location as i32,
            })
    }

    fn attrib_location(&self, program: u32, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        state.lookups += 1;

        let linked = &state.programs[&program];
        assert!(linked.linked, "querying an unlinked program");
        linked.attributes.get(name).copied()
    }

    fn use_program(&self, program: Option<u32>) {
        self.state.borrow_mut().current = program;
        self.record(Call::UseProgram(program));
    }

    fn uniform_matrix_4(&self, location: Option<&MockUniform>, matrix: &[f32; 16]) {
        self.record(Call::UniformMatrix4(location.copied(), *matrix));
    }

    fn uniform_4(&self, location: Option<&MockUniform>, value: [f32; 4]) {
        self.record(Call::Uniform4(location.copied(), value));
    }

    fn uniform_1_i32(&self, location: Option<&MockUniform>, value: i32) {
        self.record(Call::Uniform1(location.copied(), value));
    }
}

fn check_syntax(source: &str) -> Result<(), String> {
    if !source.trim_start().starts_with("#version") {
        return Err("0:1(1): error: missing #version directive\n".to_string());
    }

    let mut depth = 0i32;
    for (number, line) in source.lines().enumerate() {
        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }

            if depth < 0 {
                return Err(format!(
                    "0:{}(1): error: syntax error, unexpected '}}'\n",
                    number + 1
                ));
            }
        }
    }

    if depth != 0 {
        return Err(format!(
            "0:{}(1): error: syntax error, unexpected end of file\n",
            source.lines().count()
        ));
    }

    if !tokens(source).any(|token| token == "main") {
        return Err("0:0(0): error: no function main() defined\n".to_string());
    }

    Ok(())
}

fn link(program: &mut Program, stages: &[(ShaderStage, String, bool)]) {
    program.linked = false;
    program.uniforms.clear();
    program.attributes.clear();

    if stages.iter().any(|(_, _, compiled)| !compiled) {
        program.log = "error: linking with uncompiled shader\n".to_string();
        return;
    }

    let vertex = stages
        .iter()
        .find(|(stage, _, _)| *stage == ShaderStage::Vertex);
    let fragment = stages
        .iter()
        .find(|(stage, _, _)| *stage == ShaderStage::Fragment);
    let (vertex, fragment) = match (vertex, fragment) {
        (Some((_, vertex, _)), Some((_, fragment, _))) => (vertex, fragment),
        _ => {
            program.log = "error: program needs a vertex and a fragment shader\n".to_string();
            return;
        }
    };

    let outputs = declarations(vertex, "varying").collect::<Vec<_>>();
    if let Some(input) = declarations(fragment, "varying").find(|input| !outputs.contains(input))
    {
        program.log = format!(
            "error: fragment shader input `{input}' has no matching vertex shader output\n"
        );
        return;
    }

    let combined = format!("{vertex}\n{fragment}");
    let used = |name: &str| tokens(&combined).filter(|token| *token == name).count() > 1;

    for (_, source, _) in stages {
        for uniform in declarations(source, "uniform") {
            if used(uniform) && !program.uniforms.iter().any(|known| known == uniform) {
                program.uniforms.push(uniform.to_string());
            }
        }
    }

    // Bindings for names that are not active attributes reserve nothing.
    let active = declarations(vertex, "attribute")
        .filter(|name| used(*name))
        .collect::<Vec<_>>();
    let reserved = program
        .bindings
        .iter()
        .filter(|(_, name)| active.contains(&name.as_str()))
        .map(|(slot, _)| *slot)
        .collect::<Vec<_>>();

    for attribute in active {
        let slot = match program.bindings.iter().find(|(_, name)| name == attribute) {
            Some((slot, _)) => *slot,
            None => (0..)
                .find(|slot| {
                    !reserved.contains(slot)
                        && !program.attributes.values().any(|taken| taken == slot)
                })
                .expect("ran out of slots"),
        };
        program.attributes.insert(attribute.to_string(), slot);
    }

    program.log.clear();
    program.linked = true;
}

fn tokens(source: &str) -> impl Iterator<Item = &str> + '_ {
    source
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
}

fn declarations<'a>(source: &'a str, qualifier: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    source.lines().filter_map(move |line| {
        let mut words = line.trim().trim_end_matches(';').split_whitespace();
        if words.next()? != qualifier {
            return None;
        }
        words.nth(1)
    })
}

/// A vertex shader that declares its attributes under names the default slot map doesn't know.
pub const RENAMED_VERTEX: &str = "#version 110

uniform mat4 MProj;
uniform mat4 MView;
uniform mat4 MModel;

attribute vec3 aPosition;
attribute vec2 aTexCoord;

varying vec2 UV;

void main(void)
{
    gl_Position = MProj * MView * MModel * vec4(aPosition, 1.0);
    UV = aTexCoord;
}
";

/// A fragment shader that leaves out `bcolor` and `mytexture`.
pub const FLAT_FRAGMENT: &str = "#version 110

uniform vec4 addcolor;

varying vec2 UV;

void main(void)
{
    gl_FragColor = vec4(UV, 0.0, 1.0) * addcolor;
}
";

/// A vertex shader with a missing closing brace.
pub const BROKEN_VERTEX: &str = "#version 110

attribute vec3 vertexPos;

void main(void)
{
    gl_Position = vec4(vertexPos, 1.0);
";

/// A fragment shader with a stray closing brace.
pub const BROKEN_FRAGMENT: &str = "#version 110

void main(void)
{
    gl_FragColor = vec4(1.0);
}}
";

/// A fragment shader that reads a varying no vertex shader writes.
pub const UNMATCHED_FRAGMENT: &str = "#version 110

varying vec4 tint;

void main(void)
{
    gl_FragColor = tint;
}
";
