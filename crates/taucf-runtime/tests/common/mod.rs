//! Shared fakes for the runtime integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use taucf_core::compiler::builtin::{CC, CXX, FC, GNU, PGI};
use taucf_core::ports::{PathResolver, ProcessCommand, ProcessExecutor, ProcessOutput};
use taucf_core::{
    CfResult, CompilerInfo, FamilyKind, InstalledCompiler, InstalledCompilerFamily,
    InstalledCompilerSet, KnowledgeBase,
};

pub const GNU_BANNER: &str =
    "gcc (GCC) 12.2.0\nCopyright (C) 2022 Free Software Foundation, Inc.\n";

type Handler = Box<dyn Fn(&ProcessCommand) -> ProcessOutput + Send + Sync>;

/// Executor answering from a script of handlers and recording every call.
///
/// Commands are matched on their normalized form: the program's file name
/// followed by the arguments. A pattern matches the whole line or a prefix
/// of it ending at an argument boundary. Unmatched commands exit 127.
#[derive(Default)]
pub struct ScriptedExecutor {
    handlers: Vec<(String, Handler)>,
    calls: Mutex<Vec<ProcessCommand>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(mut self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&ProcessCommand) -> ProcessOutput + Send + Sync + 'static,
    {
        self.handlers.push((pattern.to_string(), Box::new(handler)));
        self
    }

    pub fn reply(self, pattern: &str, output: &str) -> Self {
        let output = output.to_string();
        self.on(pattern, move |_| ProcessOutput::success(output.clone()))
    }

    pub fn fail(self, pattern: &str, code: i32, output: &str) -> Self {
        let output = output.to_string();
        self.on(pattern, move |_| ProcessOutput::failure(code, output.clone()))
    }

    pub fn calls(&self) -> Vec<ProcessCommand> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(normalize).collect()
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.lines().iter().filter(|l| matches(l, pattern)).count()
    }
}

impl ProcessExecutor for ScriptedExecutor {
    fn run(&self, cmd: &ProcessCommand) -> CfResult<ProcessOutput> {
        self.calls.lock().unwrap().push(cmd.clone());
        let line = normalize(cmd);
        Ok(self
            .handlers
            .iter()
            .find(|(pattern, _)| matches(&line, pattern))
            .map_or_else(
                || ProcessOutput::failure(127, format!("{line}: command not found")),
                |(_, handler)| handler(cmd),
            ))
    }
}

fn normalize(cmd: &ProcessCommand) -> String {
    let mut parts = vec![
        Path::new(cmd.program())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    ];
    parts.extend(cmd.argv.iter().skip(1).cloned());
    parts.join(" ")
}

fn matches(line: &str, pattern: &str) -> bool {
    line == pattern || line.starts_with(&format!("{pattern} "))
}

/// Resolver backed by a fixed command table.
#[derive(Default)]
pub struct TableResolver {
    table: HashMap<String, PathBuf>,
}

impl TableResolver {
    /// Every command resolves to `dir/<command>`.
    pub fn in_dir(dir: &str, commands: &[&str]) -> Self {
        let table = commands
            .iter()
            .map(|c| ((*c).to_string(), Path::new(dir).join(c)))
            .collect();
        Self { table }
    }
}

impl PathResolver for TableResolver {
    fn which(&self, command: &str) -> Option<PathBuf> {
        if command.contains('/') {
            let path = PathBuf::from(command);
            return self.table.values().find(|p| **p == path).cloned();
        }
        self.table.get(command).cloned()
    }
}

/// A complete host compiler set from one family, without probing.
pub fn host_set(kb: &KnowledgeBase, family: &str, dir: &str) -> InstalledCompilerSet {
    InstalledCompilerSet::new(kb, host_family(kb, family, dir).iter().map(|(r, c)| (r, Arc::clone(c))))
        .unwrap()
}

pub fn host_family(kb: &KnowledgeBase, family: &str, dir: &str) -> InstalledCompilerFamily {
    let fam = kb.find_family(FamilyKind::Host, family).unwrap();
    let mut installed = InstalledCompilerFamily::new(Arc::clone(&fam));
    for role in [CC, CXX, FC] {
        let cmd = fam.aliases(role)[0].clone();
        let path = Path::new(dir).join(&cmd);
        let info = CompilerInfo::new(Arc::clone(&fam), role, cmd);
        installed.add(role, Arc::new(InstalledCompiler::new(path, info, None).unwrap()));
    }
    installed
}

pub fn gnu_set(kb: &KnowledgeBase) -> InstalledCompilerSet {
    host_set(kb, GNU, "/usr/bin")
}

pub fn pgi_set(kb: &KnowledgeBase) -> InstalledCompilerSet {
    host_set(kb, PGI, "/opt/pgi/bin")
}

pub fn builtin_kb() -> Arc<KnowledgeBase> {
    Arc::new(KnowledgeBase::builtin().unwrap())
}
