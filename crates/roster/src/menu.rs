//! Interactive menu over a [`Store`].

use std::io::{BufRead, Write};

use anyhow::Result;
use roster_core::{table, RecordPatch};
use roster_engine::Store;

const BANNER: &str = "\n===== Student Management System =====\n\
1. Add Student\n\
2. Update Student\n\
3. Delete Student\n\
4. List Students\n\
5. Exit\n";

/// Parse a grade typed by the user. Rejects NaN and infinities, which JSON cannot hold.
pub fn parse_grade(input: &str) -> Result<f64, String> {
    let grade: f64 = input
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", input.trim()))?;
    if !grade.is_finite() {
        return Err(format!("'{}' is not a finite number", input.trim()));
    }
    Ok(grade)
}

pub struct Menu<'a, R, W> {
    store: &'a mut Store,
    input: R,
    out: W,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(store: &'a mut Store, input: R, out: W) -> Self {
        Self { store, input, out }
    }

    /// Run until the user picks Exit or input ends. Store errors abort the loop.
    pub fn run(&mut self) -> Result<()> {
        loop {
            write!(self.out, "{BANNER}")?;
            let Some(choice) = self.prompt("Enter choice: ")? else {
                break;
            };
            let keep_going = match choice.trim() {
                "1" => self.add()?,
                "2" => self.update()?,
                "3" => self.delete()?,
                "4" => self.list()?,
                "5" => false,
                _ => {
                    writeln!(self.out, "Invalid choice. Try again.")?;
                    true
                }
            };
            if !keep_going {
                break;
            }
        }
        writeln!(self.out, "Exiting...")?;
        self.out.flush()?;
        Ok(())
    }

    /// Print `label` and read one line without its line ending. `None` at end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{label}")?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn add(&mut self) -> Result<bool> {
        let Some(id) = self.prompt("Enter ID: ")? else {
            return Ok(false);
        };
        let Some(name) = self.prompt("Enter Name: ")? else {
            return Ok(false);
        };
        let Some(grade) = self.prompt("Enter Grade: ")? else {
            return Ok(false);
        };
        let Ok(grade) = parse_grade(&grade) else {
            writeln!(self.out, "Invalid grade.")?;
            return Ok(true);
        };

        if self.store.add(&id, &name, grade)? {
            writeln!(self.out, "Student added!")?;
        } else {
            writeln!(self.out, "ID already exists!")?;
        }
        Ok(true)
    }

    fn update(&mut self) -> Result<bool> {
        let Some(id) = self.prompt("Enter ID to update: ")? else {
            return Ok(false);
        };
        let Some(name) = self.prompt("Enter new name (leave blank to keep same): ")? else {
            return Ok(false);
        };
        let Some(grade) = self.prompt("Enter new grade (leave blank to keep same): ")? else {
            return Ok(false);
        };

        // Only an empty answer keeps the field; whitespace is a real value.
        let mut patch = RecordPatch::new();
        if !name.is_empty() {
            patch.name = Some(name);
        }
        if !grade.is_empty() {
            match parse_grade(&grade) {
                Ok(g) => patch.grade = Some(g),
                Err(_) => {
                    writeln!(self.out, "Invalid grade.")?;
                    return Ok(true);
                }
            }
        }

        if self.store.update(&id, patch)? {
            writeln!(self.out, "Updated!")?;
        } else {
            writeln!(self.out, "Student not found.")?;
        }
        Ok(true)
    }

    fn delete(&mut self) -> Result<bool> {
        let Some(id) = self.prompt("Enter ID to delete: ")? else {
            return Ok(false);
        };
        if self.store.delete(&id)? {
            writeln!(self.out, "Deleted!")?;
        } else {
            writeln!(self.out, "Student not found.")?;
        }
        Ok(true)
    }

    fn list(&mut self) -> Result<bool> {
        writeln!(self.out)?;
        write!(self.out, "{}", table::render_table(&self.store.list()))?;
        Ok(true)
    }
}
