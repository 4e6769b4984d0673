use crate::progress::quests::{Quest, QuestBundle, QuestType};

pub struct QuestTemplate {
    pub id: &'static str,
    pub text: &'static str,
    pub goal: u32,
    pub xp_reward: u32,
    pub quest_type: QuestType,
}

/// The fixed daily template: one XP-accumulation quest, one
/// module-completion quest, one login quest.
pub const DAILY_QUEST_TEMPLATES: [QuestTemplate; 3] = [
    QuestTemplate {
        id: "daily_xp",
        text: "Earn 100 XP",
        goal: 100,
        xp_reward: 25,
        quest_type: QuestType::Xp,
    },
    QuestTemplate {
        id: "daily_module",
        text: "Complete a lesson module",
        goal: 1,
        xp_reward: 30,
        quest_type: QuestType::Module,
    },
    QuestTemplate {
        id: "daily_login",
        text: "Show up today",
        goal: 1,
        xp_reward: 10,
        quest_type: QuestType::Login,
    },
];

/// Instantiate the template set for a calendar day. The login quest is
/// pre-completed at generation; its reward is not routed through XP accrual.
pub fn generate_daily_quests(date: &str) -> QuestBundle {
    let quests = DAILY_QUEST_TEMPLATES
        .iter()
        .map(|template| {
            let done = template.quest_type == QuestType::Login;
            Quest {
                id: template.id.to_string(),
                text: template.text.to_string(),
                goal: template.goal,
                progress: if done { template.goal } else { 0 },
                completed: done,
                xp_reward: template.xp_reward,
                quest_type: template.quest_type,
            }
        })
        .collect();
    QuestBundle {
        date: date.to_string(),
        quests,
    }
}
