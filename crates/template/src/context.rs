//! Everything a render needs besides the template and its values.
use crate::attrs::{AttributePolicy, Target};
use crate::component::ComponentRegistry;
use crate::config::TemplateConfig;
use crate::dom::Dom;
use crate::reactive::Runtime;
use std::rc::Rc;

pub struct Context<D: Dom> {
    pub dom: D,
    pub runtime: Rc<dyn Runtime>,
    pub policy: AttributePolicy<D>,
    pub components: ComponentRegistry<D::Node>,
    pub config: TemplateConfig,
}

impl<D: Dom> Context<D> {
    pub fn new(dom: D, runtime: Rc<dyn Runtime>) -> Self {
        Self {
            dom,
            runtime,
            policy: AttributePolicy::builtin(),
            components: ComponentRegistry::new(),
            config: TemplateConfig::default(),
        }
    }

    pub fn target<'a>(&'a self, node: &'a D::Node) -> Target<'a, D> {
        Target {
            dom: &self.dom,
            node,
            config: &self.config,
        }
    }
}
