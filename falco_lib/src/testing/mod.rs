//! Fake external tools and inputs for exercising the stages end to end

pub mod tools;

pub use tools::{
    break_tool, fake_pipeline, paired_end_batch, set_permissions, single_end_batch,
    write_tool_script,
};
