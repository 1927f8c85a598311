//! The interactive command loop: parses textual commands and routes them to
//! the engine, translating error variants into user-facing messages.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use tfs_rs::layout::fcb::{FCB_SIZE, Fcb};
use tfs_rs::{FsError, Tfs};

const HELP: &str = "\
help - list the available commands
mkfs - create a new file system, destroying any existing one
mount - mount the file system
sync - write file system metadata back to disk
prrfs - print the metadata currently on disk
prmfs - print the metadata currently in memory
umount - unmount the file system
exit - shut the file system down and leave the shell

mkdir /path/name - create a directory (intermediates are not created)
rmdir /path/name - remove an empty directory
ls /path|/ - list a directory
create /path/name - create an empty file
rm /path/name - remove a file
print /path/name <pos> <n> - print n characters from pos
append /path/name - append entered lines to a file (empty line ends input)
cp /src /dst - copy a file to a new destination
rename /path/name newname - rename a file in place

Names longer than 15 bytes are truncated.";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Mkfs,
    Mount,
    Sync,
    Prrfs,
    Prmfs,
    Umount,
    Exit,
    Mkdir(String),
    Rmdir(String),
    Ls(String),
    Create(String),
    Rm(String),
    Print {
        path: String,
        position: i32,
        count: i32,
    },
    Append(String),
    Cp {
        src: String,
        dst: String,
    },
    Rename {
        path: String,
        new_name: String,
    },
}

pub struct Shell {
    tfs: Tfs,
    container: PathBuf,
    size: u64,
    block_size: usize,
}

impl Shell {
    #[must_use]
    pub fn new(container: PathBuf, size: u64, block_size: usize) -> Self {
        Self {
            tfs: Tfs::new(),
            container,
            size,
            block_size,
        }
    }

    /// Runs the command loop until `exit` or end of input.
    ///
    /// # Errors
    /// Returns an error only for I/O failures on the console streams.
    pub fn run(&mut self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        writeln!(out, "TFS file system shell. Type help for the command list.")?;
        let mut line = String::new();
        loop {
            write!(out, "tfs> ")?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_command(trimmed) {
                None => writeln!(out, "Invalid command. Type help for the command list.")?,
                Some(Command::Exit) => {
                    if self.tfs.exit().is_err() {
                        writeln!(out, "Error. Could not safely close the file system.")?;
                    } else {
                        writeln!(out, "Closing file system and exiting.")?;
                    }
                    break;
                }
                Some(command) => self.dispatch(command, input, out)?,
            }
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        command: Command,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<()> {
        match command {
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Mkfs => self.run_mkfs(input, out)?,
            Command::Mount => match self.tfs.mount(&self.container, self.size, self.block_size) {
                Ok(()) => writeln!(out, "File system mounted.")?,
                Err(FsError::AlreadyMounted) => {
                    writeln!(out, "File system has already been mounted.")?;
                }
                Err(_) => writeln!(out, "Error. File system not mounted successfully.")?,
            },
            Command::Sync => match self.tfs.sync() {
                Ok(()) => writeln!(out, "Synchronization complete.")?,
                Err(_) => writeln!(out, "Error. Synchronization failed.")?,
            },
            Command::Prrfs => match self.tfs.print_disk_state() {
                Ok(text) => writeln!(out, "{text}")?,
                Err(_) => writeln!(out, "Could not print stored file system data.")?,
            },
            Command::Prmfs => match self.tfs.print_memory_state() {
                Ok(text) => writeln!(out, "{text}")?,
                Err(_) => writeln!(
                    out,
                    "Cannot print file system from memory. File system not mounted."
                )?,
            },
            Command::Umount => match self.tfs.unmount() {
                Ok(()) => writeln!(out, "Unmount successful.")?,
                Err(_) => writeln!(out, "File system has not been mounted. Cannot unmount.")?,
            },
            Command::Exit => unreachable!("handled by the caller"),
            Command::Mkdir(path) => match self.tfs.mkdir(&path) {
                Ok(()) => writeln!(out, "Directory created.")?,
                Err(FsError::DuplicateEntry) => {
                    writeln!(out, "Error. Directory already exists.")?;
                }
                Err(_) => writeln!(out, "Error. Could not create directory.")?,
            },
            Command::Rmdir(path) => match self.tfs.rmdir(&path) {
                Ok(()) => writeln!(out, "Directory deleted.")?,
                Err(FsError::DirNotEmpty) => {
                    writeln!(out, "Cannot delete directory. Directory is not empty.")?;
                }
                Err(_) => writeln!(out, "Error. Directory could not be deleted.")?,
            },
            Command::Ls(path) => match self.tfs.ls(&path) {
                Ok(entries) => writeln!(out, "{}", format_listing(&entries))?,
                Err(FsError::NotMounted) => writeln!(out, "File system not mounted.")?,
                Err(_) => writeln!(out, "Target directory not found.")?,
            },
            Command::Create(path) => match self.tfs.create_empty(&path) {
                Ok(_) => writeln!(out, "File created.")?,
                Err(FsError::DuplicateEntry) => {
                    writeln!(out, "Error. File already exists in directory.")?;
                }
                Err(_) => writeln!(out, "Could not create file.")?,
            },
            Command::Rm(path) => match self.tfs.rm(&path) {
                Ok(()) => writeln!(out, "File deleted.")?,
                Err(FsError::NotFound) => {
                    writeln!(out, "Error. File does not exist in directory.")?;
                }
                Err(_) => writeln!(out, "Could not remove file.")?,
            },
            Command::Print {
                path,
                position,
                count,
            } => match self.tfs.read_range(&path, position, count) {
                Ok(text) => writeln!(out, "{text}")?,
                Err(FsError::NotFound) => writeln!(out, "Target file not in directory.")?,
                Err(FsError::InvalidRead) => writeln!(out, "Invalid file range to read.")?,
                Err(_) => writeln!(out, "Read failed.")?,
            },
            Command::Append(path) => self.run_append(&path, input, out)?,
            Command::Cp { src, dst } => match self.tfs.cp(&src, &dst) {
                Ok(()) => writeln!(out, "Copy completed.")?,
                Err(FsError::NotFound) => writeln!(out, "Source file cannot be found.")?,
                Err(FsError::DuplicateEntry) => writeln!(
                    out,
                    "File with target name already exists in parent directory."
                )?,
                Err(_) => writeln!(out, "Error. Source file could not be copied.")?,
            },
            Command::Rename { path, new_name } => match self.tfs.rename(&path, &new_name) {
                Ok(()) => writeln!(out, "File renamed.")?,
                Err(FsError::DuplicateEntry) => writeln!(
                    out,
                    "Could not rename file. A file with that name already exists."
                )?,
                Err(_) => writeln!(out, "Error. Could not rename file.")?,
            },
        }
        Ok(())
    }

    fn run_mkfs(&mut self, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
        if self.tfs.is_mounted() {
            writeln!(
                out,
                "Cannot create file system. Existing file system already mounted."
            )?;
            return Ok(());
        }
        writeln!(out, "This will destroy any existing TFS file system.")?;
        write!(out, "Enter y to continue: ")?;
        out.flush()?;
        let mut reply = String::new();
        input.read_line(&mut reply)?;
        if !reply.trim().eq_ignore_ascii_case("y") {
            return Ok(());
        }
        match self.tfs.mkfs(&self.container, self.size, self.block_size) {
            Ok(()) => writeln!(out, "File system created.")?,
            Err(_) => writeln!(out, "Error. File system not created successfully.")?,
        }
        Ok(())
    }

    fn run_append(
        &mut self,
        path: &str,
        input: &mut impl BufRead,
        out: &mut impl Write,
    ) -> Result<()> {
        let mut data = String::new();
        loop {
            writeln!(out, "Enter a line to append (empty line to finish):")?;
            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                break;
            }
            data.push_str(trimmed);
            data.push('\n');
        }
        if data.is_empty() {
            writeln!(out, "No input given. File was not modified.")?;
            return Ok(());
        }
        match self.tfs.append(path, data.as_bytes()) {
            Ok(()) => writeln!(out, "Write finished.")?,
            Err(FsError::NotFound) => {
                writeln!(out, "Error. File not found in parent directory.")?;
            }
            Err(_) => writeln!(out, "Error. Could not write to file.")?,
        }
        Ok(())
    }
}

fn parse_command(line: &str) -> Option<Command> {
    let mut parts = line.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    match (head, rest.as_slice()) {
        ("help", []) => Some(Command::Help),
        ("mkfs", []) => Some(Command::Mkfs),
        ("mount", []) => Some(Command::Mount),
        ("sync", []) => Some(Command::Sync),
        ("prrfs", []) => Some(Command::Prrfs),
        ("prmfs", []) => Some(Command::Prmfs),
        ("umount", []) => Some(Command::Umount),
        ("exit", []) => Some(Command::Exit),
        ("mkdir", [p]) if is_path(p) => Some(Command::Mkdir((*p).to_string())),
        ("rmdir", [p]) if is_path(p) => Some(Command::Rmdir((*p).to_string())),
        ("ls", [p]) if *p == "/" || is_path(p) => Some(Command::Ls((*p).to_string())),
        ("create", [p]) if is_path(p) => Some(Command::Create((*p).to_string())),
        ("rm", [p]) if is_path(p) => Some(Command::Rm((*p).to_string())),
        ("append", [p]) if is_path(p) => Some(Command::Append((*p).to_string())),
        ("print", [p, pos, n]) if is_path(p) => {
            let position = pos.parse().ok()?;
            let count = n.parse().ok()?;
            Some(Command::Print {
                path: (*p).to_string(),
                position,
                count,
            })
        }
        ("cp", [s, d]) if is_path(s) && is_path(d) => Some(Command::Cp {
            src: (*s).to_string(),
            dst: (*d).to_string(),
        }),
        ("rename", [p, n]) if is_path(p) && !n.contains('/') => Some(Command::Rename {
            path: (*p).to_string(),
            new_name: (*n).to_string(),
        }),
        _ => None,
    }
}

fn is_path(p: &str) -> bool {
    p.len() >= 2
        && p.starts_with('/')
        && !p.ends_with('/')
        && p[1..].split('/').all(|c| !c.is_empty())
}

fn format_listing(entries: &[Fcb]) -> String {
    if entries.is_empty() {
        return "Empty directory".to_string();
    }
    let mut text = format!("Directory with {} entries:", entries.len());
    for entry in entries {
        if entry.is_dir() {
            text.push_str(&format!(
                "\n  dir   {} ({} entries)",
                entry.name(),
                entry.size() / FCB_SIZE as i32
            ));
        } else {
            text.push_str(&format!(
                "\n  file  {} ({} bytes)",
                entry.name(),
                entry.size()
            ));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempfile::NamedTempFile;

    use super::{Command, Shell, parse_command};

    #[test]
    fn parses_management_commands() {
        assert_eq!(parse_command("help"), Some(Command::Help));
        assert_eq!(parse_command("  mount  "), Some(Command::Mount));
        assert_eq!(parse_command("umount"), Some(Command::Umount));
        assert_eq!(parse_command("mount now"), None);
    }

    #[test]
    fn parses_path_commands() {
        assert_eq!(
            parse_command("mkdir /a/b"),
            Some(Command::Mkdir("/a/b".to_string()))
        );
        assert_eq!(parse_command("ls /"), Some(Command::Ls("/".to_string())));
        assert_eq!(parse_command("mkdir /"), None);
        assert_eq!(parse_command("mkdir a"), None);
        assert_eq!(parse_command("rm /a/"), None);
    }

    #[test]
    fn parses_print_with_range() {
        assert_eq!(
            parse_command("print /f 0 5"),
            Some(Command::Print {
                path: "/f".to_string(),
                position: 0,
                count: 5
            })
        );
        assert_eq!(parse_command("print /f zero 5"), None);
        assert_eq!(parse_command("print /f 0"), None);
    }

    #[test]
    fn parses_two_path_commands() {
        assert_eq!(
            parse_command("cp /src /dst"),
            Some(Command::Cp {
                src: "/src".to_string(),
                dst: "/dst".to_string()
            })
        );
        assert_eq!(
            parse_command("rename /old fresh"),
            Some(Command::Rename {
                path: "/old".to_string(),
                new_name: "fresh".to_string()
            })
        );
        assert_eq!(parse_command("rename /old /fresh"), None);
    }

    #[test]
    fn scripted_session_round_trips() {
        let tf = NamedTempFile::new().expect("tmp file");
        let mut shell = Shell::new(tf.path().to_path_buf(), 65535, 128);

        let script = "mkfs\n\
                      y\n\
                      mount\n\
                      mkdir /docs\n\
                      create /docs/note\n\
                      append /docs/note\n\
                      hello shell\n\
                      \n\
                      print /docs/note 0 11\n\
                      ls /docs\n\
                      umount\n\
                      exit\n";
        let mut output = Vec::new();
        shell
            .run(&mut Cursor::new(script), &mut output)
            .expect("run");

        let text = String::from_utf8(output).expect("utf8 output");
        assert!(text.contains("File system created."));
        assert!(text.contains("File system mounted."));
        assert!(text.contains("Directory created."));
        assert!(text.contains("File created."));
        assert!(text.contains("Write finished."));
        assert!(text.contains("hello shell"));
        assert!(text.contains("note (12 bytes)"));
        assert!(text.contains("Unmount successful."));
        assert!(text.contains("Closing file system and exiting."));
    }

    #[test]
    fn commands_without_a_mount_report_it() {
        let tf = NamedTempFile::new().expect("tmp file");
        let mut shell = Shell::new(tf.path().to_path_buf(), 65535, 128);

        let mut output = Vec::new();
        shell
            .run(&mut Cursor::new("ls /\nexit\n"), &mut output)
            .expect("run");
        let text = String::from_utf8(output).expect("utf8 output");
        assert!(text.contains("File system not mounted."));
    }
}
