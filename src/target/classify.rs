//! CLASSIFY target: sets `skb->priority` to a traffic-control class
//!
//! Options:
//! - `--set-class MAJOR:MINOR` (required, at most once)

use crate::handle::Priority;
use crate::target::{Family, OptionSpec, Target, TargetEntry};
use crate::{ClassifyError, Result, VERSION};
use std::io::Write;
use xt_classify_common::{ClassifyTargetInfo, PAYLOAD_SIZE};

pub const NAME: &str = "CLASSIFY";

const OPT_SET_CLASS: char = '1';

const OPTIONS: &[OptionSpec] = &[OptionSpec {
    name: "set-class",
    has_arg: true,
    id: OPT_SET_CLASS,
}];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifyTarget {
    family: Family,
}

impl ClassifyTarget {
    pub const fn new(family: Family) -> Self {
        Self { family }
    }

    /// Decode the handle stored in an entry's payload
    pub fn priority(entry: &TargetEntry) -> Result<Priority> {
        let data = entry.data();
        check_size(data.len())?;
        let info = ClassifyTargetInfo::from_bytes(data).ok_or(ClassifyError::PayloadSize {
            expected: PAYLOAD_SIZE,
            actual: data.len(),
        })?;
        Ok(Priority::from_raw(info.priority))
    }

    /// Write a handle into an entry's payload
    pub fn set_priority(entry: &mut TargetEntry, priority: Priority) -> Result<()> {
        let data = entry.data_mut();
        check_size(data.len())?;
        data.copy_from_slice(&ClassifyTargetInfo::new(priority.raw()).to_bytes());
        Ok(())
    }
}

fn check_size(actual: usize) -> Result<()> {
    if actual != PAYLOAD_SIZE {
        return Err(ClassifyError::PayloadSize {
            expected: PAYLOAD_SIZE,
            actual,
        });
    }
    Ok(())
}

impl Target for ClassifyTarget {
    fn name(&self) -> &str {
        NAME
    }

    fn family(&self) -> Family {
        self.family
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn size(&self) -> usize {
        PAYLOAD_SIZE
    }

    fn userspace_size(&self) -> usize {
        PAYLOAD_SIZE
    }

    fn options(&self) -> &[OptionSpec] {
        OPTIONS
    }

    fn help(&self, out: &mut dyn Write) -> Result<()> {
        write!(
            out,
            "CLASSIFY target v{} options:\n  --set-class [MAJOR:MINOR]    Set skb->priority value\n\n",
            VERSION
        )?;
        Ok(())
    }

    fn parse(&self, id: char, arg: Option<&str>, entry: &mut TargetEntry) -> Result<bool> {
        if id != OPT_SET_CLASS {
            return Ok(false);
        }

        // the value is checked before the repeat, so a bad second value
        // reports the value
        let arg = arg.unwrap_or_default();
        let priority: Priority = arg
            .parse()
            .map_err(|_| ClassifyError::BadClassValue(arg.to_string()))?;

        if entry.flags != 0 {
            return Err(ClassifyError::SpecifiedTwice);
        }

        Self::set_priority(entry, priority)?;
        entry.flags = 1;
        Ok(true)
    }

    fn final_check(&self, flags: u32) -> Result<()> {
        if flags == 0 {
            return Err(ClassifyError::MissingSetClass);
        }
        Ok(())
    }

    fn print(&self, entry: &TargetEntry, _numeric: bool, out: &mut dyn Write) -> Result<()> {
        let priority = Self::priority(entry)?;
        write!(out, "CLASSIFY set {} ", priority)?;
        Ok(())
    }

    fn save(&self, entry: &TargetEntry, out: &mut dyn Write) -> Result<()> {
        let priority = Self::priority(entry)?;
        write!(out, "--set-class {} ", priority.save_form())?;
        Ok(())
    }
}
