// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::params::Behavior;
use crate::config::StageDescriptor;

use super::branching::{BranchClone, BranchIf, BranchRef};
use super::factorial::FactorialCalc;
use super::messaging::{Reset, SendMessage};
use super::pass_through::{PassThrough, Waste};
use super::reverse_string::ReverseString;
use super::seq_packet::SeqPacket;
use super::sink::Sink;
use super::tank_feed::TankFeed;
use super::tank_queue::TankQueue;
use super::wrap::Wrap;

/// Stages that send messages to another stage.
pub const ADDRESSED: Behavior = Behavior {
    name: "addressed",
    keys: &["destination"],
};

/// Stages that keep what passes through them.
pub const COLLECTING: Behavior = Behavior {
    name: "collecting",
    keys: &["max_results:0", "capture_msgs:false"],
};

/// Stages backed by a priority buffer.
pub const BUFFERED: Behavior = Behavior {
    name: "buffered",
    keys: &["tank_size:0", "priority_field_name:seq_num"],
};

/// Descriptors for every built-in stage type.
pub fn builtin_descriptors() -> Vec<StageDescriptor> {
    vec![
        StageDescriptor::new("pass_through", "Forwards units unchanged", &[], &[], || {
            Box::new(PassThrough)
        }),
        StageDescriptor::new("waste", "Discards every unit", &[], &[], || {
            Box::new(Waste::default())
        }),
        StageDescriptor::new(
            "sink",
            "Keeps the units it receives",
            &[COLLECTING],
            &["max_results:30"],
            || Box::new(Sink::default()),
        ),
        StageDescriptor::new("reverse_string", "Reverses the text payload", &[], &[], || {
            Box::new(ReverseString::new())
        }),
        StageDescriptor::new(
            "wrap",
            "Adds a prefix and a suffix to the payload",
            &[],
            &["data_prefix:empty", "data_suffix:empty"],
            || Box::new(Wrap::default()),
        ),
        StageDescriptor::new(
            "seq_packet",
            "Numbers units in arrival order",
            &[],
            &["seq_packet_field_name:seq_num", "start:0"],
            || Box::new(SeqPacket::default()),
        ),
        StageDescriptor::new(
            "branch_clone",
            "Sends a copy down the branch",
            &[],
            &[],
            || Box::new(BranchClone),
        ),
        StageDescriptor::new(
            "branch_ref",
            "Sends the same unit down the branch",
            &[],
            &[],
            || Box::new(BranchRef),
        ),
        StageDescriptor::new(
            "branch_if",
            "Branches when a comparison holds",
            &[],
            &[
                "branch_key",
                "comparison:equals",
                "compare_value:true",
                "branch_on_packet:true",
            ],
            || Box::new(BranchIf::default()),
        ),
        StageDescriptor::new(
            "factorial_calc",
            "One step of an iterative factorial",
            &[],
            &[],
            || Box::new(FactorialCalc),
        ),
        StageDescriptor::new(
            "tank_queue",
            "Bounded priority buffer",
            &[BUFFERED],
            &[],
            || Box::new(TankQueue::default()),
        ),
        StageDescriptor::new(
            "tank_feed",
            "Feeds a loop back into a tank_queue",
            &[],
            &[],
            || Box::new(TankFeed::default()),
        ),
        StageDescriptor::new(
            "send_message",
            "Sends a fixed message ahead of each unit",
            &[ADDRESSED],
            &["message", "single_use:true"],
            || Box::new(SendMessage::default()),
        ),
        StageDescriptor::new(
            "reset",
            "Resets a parameter on another stage",
            &[ADDRESSED],
            &["param_name", "new_value:none"],
            || Box::new(Reset::default()),
        ),
    ]
}
