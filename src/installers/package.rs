// Plain distribution packages (gcc, gdb, git, tmux, ...). Every hook is the
// `Deploy` default: probe `<command> --version`, `apt-get install`, `apt-get purge`.

use crate::libs::deployer::Deploy;

pub struct Package;

impl Deploy for Package {}
