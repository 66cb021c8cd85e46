use super::command::{Command, CommandKind, Script};
use crate::{
    id::Side,
    iter::IterControl,
    object_table::{ObjectTable, TableOpts},
};
use miette::Diagnostic;
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Diagnostic, Debug)]
pub enum InterpreterError {
    #[error("Could not write script output")]
    Output(#[from] io::Error),
}

/// Runs table scripts against an [`ObjectTable`] of object names, writing
/// each command's result as a line of output.
///
/// Table errors are part of the output (`error: ...`) rather than failures,
/// so a script can check that an operation is refused.
pub struct Interpreter<W: Write> {
    table: ObjectTable<String>,
    opts: TableOpts,
    stdout: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(stdout: W, side: Side, opts: TableOpts) -> Self {
        Self {
            table: ObjectTable::with_opts(side, opts),
            opts,
            stdout,
        }
    }

    pub fn table(&self) -> &ObjectTable<String> {
        &self.table
    }

    pub fn run(&mut self, script: &Script) -> Result<(), InterpreterError> {
        for command in &script.commands {
            self.execute(command)?;
        }
        Ok(())
    }

    fn execute(&mut self, command: &Command) -> Result<(), InterpreterError> {
        debug!(kind = ?command.kind, "executing");
        match &command.kind {
            CommandKind::New { side, limit } => {
                let opts = limit.map_or(self.opts, |limit| self.opts.with_max_objects(limit));
                self.table = ObjectTable::with_opts(*side, opts);
            }
            CommandKind::InsertNew { flag, name } => {
                match self.table.insert_new(*flag, name.clone()) {
                    Ok(id) => writeln!(self.stdout, "{}", id)?,
                    Err(err) => writeln!(self.stdout, "error: {}", err)?,
                }
            }
            CommandKind::InsertAt { flag, id, name } => {
                match self.table.insert_at(*flag, *id, name.clone()) {
                    Ok(_) => writeln!(self.stdout, "ok")?,
                    Err(err) => writeln!(self.stdout, "error: {}", err)?,
                }
            }
            CommandKind::ReserveNew { id } => match self.table.reserve_new(*id) {
                Ok(()) => writeln!(self.stdout, "ok")?,
                Err(err) => writeln!(self.stdout, "error: {}", err)?,
            },
            CommandKind::Remove { id } => {
                let removed = self.table.remove(*id);
                write_name(&mut self.stdout, removed.as_deref())?;
            }
            CommandKind::Vacate { id } => {
                let vacated = self.table.vacate(*id);
                write_name(&mut self.stdout, vacated.as_deref())?;
            }
            CommandKind::Lookup { id } => {
                let found = self.table.lookup(*id).map(String::as_str);
                write_name(&mut self.stdout, found)?;
            }
            CommandKind::LookupFlags { id } => {
                writeln!(self.stdout, "{}", self.table.lookup_flags(*id))?;
            }
            CommandKind::ForEach { stop_at } => {
                let mut visited = Vec::new();
                self.table.for_each(|name, flag| {
                    visited.push(format!("{} {}", name, flag));
                    if stop_at.as_deref() == Some(name.as_str()) {
                        IterControl::Stop
                    } else {
                        IterControl::Continue
                    }
                });
                for line in visited {
                    writeln!(self.stdout, "{}", line)?;
                }
            }
            CommandKind::Len { namespace } => {
                writeln!(self.stdout, "{}", self.table.len(*namespace))?;
            }
            CommandKind::Clear => self.table.clear(),
        }
        Ok(())
    }
}

fn write_name<W: Write>(out: &mut W, name: Option<&str>) -> io::Result<()> {
    writeln!(out, "{}", name.unwrap_or("none"))
}
