use crate::genomics::{NodePlace, NodeType};
use crate::NodeId;

use std::fmt;

/// Steepness of the activation sigmoid.
const SIGMOID_SLOPE: f32 = 4.924273;

/// The runtime counterpart of a genome node.
///
/// Holds the node's activation history and, while a network
/// is alive, the indices of the links feeding into it.
#[derive(Clone, Debug, PartialEq)]
pub struct Neuron {
    id: NodeId,
    place: NodePlace,
    pub(super) incoming: Vec<usize>,
    activation: f32,
    last_activation: f32,
    previous_activation: f32,
    activation_count: usize,
    active_sum: f32,
    active: bool,
    pub(super) inner_level: usize,
    pub(super) visited: bool,
}

impl Neuron {
    pub(super) fn new(id: NodeId, place: NodePlace) -> Neuron {
        Neuron {
            id,
            place,
            incoming: vec![],
            activation: 0.0,
            last_activation: 0.0,
            previous_activation: 0.0,
            activation_count: 0,
            active_sum: 0.0,
            active: false,
            inner_level: 0,
            visited: false,
        }
    }

    /// Returns the id of the genome node this neuron expresses.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the neuron's place in the topology.
    pub fn place(&self) -> NodePlace {
        self.place
    }

    /// Returns `true` for input and bias neurons.
    pub fn is_sensor(&self) -> bool {
        self.place.node_type() == NodeType::Sensor
    }

    /// Returns the indices of the links feeding into the neuron.
    pub fn incoming(&self) -> &[usize] {
        &self.incoming
    }

    /// Returns the neuron's current activation.
    pub fn activation(&self) -> f32 {
        self.activation
    }

    /// Returns how many times the neuron has been
    /// activated or loaded since the last flush.
    pub fn activation_count(&self) -> usize {
        self.activation_count
    }

    /// Returns the weighted input sum of the neuron's
    /// latest activation pass.
    pub fn active_sum(&self) -> f32 {
        self.active_sum
    }

    /// Returns whether any active signal reached the
    /// neuron during the latest activation pass.
    pub fn active(&self) -> bool {
        self.active
    }

    /// The value seen by undelayed outgoing links.
    pub(super) fn output(&self) -> f32 {
        if self.activation_count > 0 {
            self.activation
        } else {
            0.0
        }
    }

    /// The value seen by time-delayed outgoing links.
    pub(super) fn delayed_output(&self) -> f32 {
        if self.activation_count > 1 {
            self.last_activation
        } else {
            0.0
        }
    }

    fn push_activation(&mut self, activation: f32) {
        self.previous_activation = self.last_activation;
        self.last_activation = self.activation;
        self.activation = activation;
        self.activation_count += 1;
    }

    /// Loads a sensor value.
    pub(super) fn load(&mut self, value: f32) {
        self.push_activation(value);
    }

    /// Records a pass's input sum and, if it carried an
    /// active signal, fires the neuron through the sigmoid.
    pub(super) fn fire(&mut self, sum: f32, active: bool) {
        self.active_sum = sum;
        self.active = active;
        if active {
            self.push_activation(sigmoid(sum));
        }
    }

    pub(super) fn flush(&mut self) {
        self.activation = 0.0;
        self.last_activation = 0.0;
        self.previous_activation = 0.0;
        self.activation_count = 0;
        self.active_sum = 0.0;
        self.active = false;
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-SIGMOID_SLOPE * x).exp())
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Neuron({}, {:?}) = {:.6} [{}]",
            self.id, self.place, self.activation, self.activation_count
        )
    }
}
