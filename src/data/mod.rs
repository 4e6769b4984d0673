pub mod quest_templates;
