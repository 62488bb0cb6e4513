//! Prompt generation for agents and the hierarchical manager.
//!
//! The text slices follow the ReAct conventions the parser in
//! [`crate::agents::parser`] understands.

use serde::{Deserialize, Serialize};

use crate::utilities::string_utils::fill_slots;

/// Prompt text slices.
pub mod slices {
    pub const ROLE_PLAYING: &str = "You are {role}. {backstory}\nYour personal goal is: {goal}";

    pub const TOOLS: &str = "\nYou ONLY have access to the following tools, and should NEVER make up tools that are not listed here:\n\n\
{tools}\n\n\
IMPORTANT: Use the following format in your response:\n\n\
```\n\
Thought: you should always think about what to do\n\
Action: the action to take, only one name of [{tool_names}], just the name, exactly as it's written.\n\
Action Input: the input to the action, just a simple JSON object, enclosed in curly braces, using \" to wrap keys and values.\n\
Observation: the result of the action\n\
```\n\n\
Once all necessary information is gathered, return the following format:\n\n\
```\n\
Thought: I now know the final answer\n\
Final Answer: the final answer to the original input question\n\
```";

    pub const NO_TOOLS: &str = "\nTo give my best complete final answer to the task respond using the exact following format:\n\n\
Thought: I now can give a great answer\n\
Final Answer: Your final answer must be the great and the most complete as possible, it must be outcome described.\n\n\
I MUST use these formats, my job depends on it!";

    pub const TASK: &str = "\nCurrent Task: {input}\n\n\
Begin! This is VERY important to you, use the tools available and give your best Final Answer, your job depends on it!\n\n\
Thought:";

    pub const TASK_NO_TOOLS: &str = "\nCurrent Task: {input}\n\n\
Begin! This is VERY important to you, your job depends on it!\n\n\
Thought:";

    pub const TASK_WITH_CONTEXT: &str = "{task}\n\nThis is the context you're working with:\n{context}";

    pub const MARKDOWN: &str = "Your final answer MUST be formatted in Markdown syntax.\n\
Follow these guidelines:\n\
- Use # for headers\n\
- Use ** for bold text\n\
- Use * for italic text\n\
- Use - or * for bullet points\n\
- Use `code` for inline code\n\
- Use ```language for code blocks";

    pub const TOOL_NOT_FOUND: &str =
        "Action '{tool}' don't exist, these are the only available Actions:\n{tools}";

    pub const NO_TOOLS_AVAILABLE: &str =
        "Action '{tool}' don't exist, you have no tools available. Give your Final Answer instead.";

    pub const MANAGER_ROLE: &str = "Crew Manager";

    pub const MANAGER_GOAL: &str = "Manage the team to complete the task in the best way possible.";

    pub const MANAGER_BACKSTORY: &str = "You are a seasoned manager with a knack for getting the best out of your team.\n\
You are also known for your ability to delegate work to the right people, and to ask the right questions to get the best out of your team.\n\
Even though you don't perform tasks by yourself, you have a lot of experience in the field, which allows you to properly evaluate the work of your team members.";
}

/// Agent info needed for prompt interpolation.
#[derive(Debug, Clone, Copy)]
pub struct AgentInfo<'a> {
    pub role: &'a str,
    pub goal: &'a str,
    pub backstory: &'a str,
}

/// System and user halves of a task prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPromptResult {
    /// The system prompt component.
    pub system: String,
    /// The user prompt component.
    pub user: String,
}

/// Builds prompts for one agent turn.
#[derive(Debug, Clone, Default)]
pub struct Prompts {
    /// Rendered `Tool Name: ... / Tool Description: ...` block.
    pub tools_description: String,
    /// Names the model may put in `Action:`.
    pub tool_names: Vec<String>,
}

impl Prompts {
    pub fn new(tools_description: impl Into<String>, tool_names: Vec<String>) -> Self {
        Self {
            tools_description: tools_description.into(),
            tool_names,
        }
    }

    /// Whether the agent has access to tools.
    pub fn has_tools(&self) -> bool {
        !self.tool_names.is_empty()
    }

    /// Generate the system and user prompts for `task_input`.
    pub fn task_execution(&self, agent: AgentInfo<'_>, task_input: &str) -> SystemPromptResult {
        let role_playing = fill_slots(
            slices::ROLE_PLAYING,
            &[
                ("role", agent.role),
                ("goal", agent.goal),
                ("backstory", agent.backstory),
            ],
        );

        let (instructions, task) = if self.has_tools() {
            let tool_names = self.tool_names.join(", ");
            let tools = fill_slots(
                slices::TOOLS,
                &[("tools", self.tools_description.as_str()), ("tool_names", tool_names.as_str())],
            );
            (tools, slices::TASK)
        } else {
            (slices::NO_TOOLS.to_string(), slices::TASK_NO_TOOLS)
        };

        SystemPromptResult {
            system: format!("{}{}", role_playing, instructions),
            user: fill_slots(task, &[("input", task_input)])
                .trim_start()
                .to_string(),
        }
    }

    /// Observation shown when the model names a tool it does not hold.
    pub fn tool_not_found(&self, tool: &str) -> String {
        if self.has_tools() {
            let tools = self.tool_names.join(", ");
            fill_slots(slices::TOOL_NOT_FOUND, &[("tool", tool), ("tools", tools.as_str())])
        } else {
            fill_slots(slices::NO_TOOLS_AVAILABLE, &[("tool", tool)])
        }
    }
}

/// Append prior task outputs to a task prompt.
pub fn task_with_context(task: &str, context: &str) -> String {
    if context.trim().is_empty() {
        return task.to_string();
    }
    fill_slots(
        slices::TASK_WITH_CONTEXT,
        &[("task", task), ("context", context)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: AgentInfo<'static> = AgentInfo {
        role: "Venue Finder",
        goal: "Find a venue for RustConf",
        backstory: "Knows every hall in town.",
    };

    #[test]
    fn test_prompt_with_tools() {
        let prompts = Prompts::new(
            "Tool Name: search\nTool Description: Search the web",
            vec!["search".into()],
        );
        let result = prompts.task_execution(AGENT, "List three venues");
        assert!(result
            .system
            .starts_with("You are Venue Finder. Knows every hall in town.\nYour personal goal is: Find a venue for RustConf"));
        assert!(result.system.contains("only one name of [search]"));
        assert!(result.user.starts_with("Current Task: List three venues"));
        assert!(result.user.ends_with("Thought:"));
    }

    #[test]
    fn test_prompt_without_tools() {
        let result = Prompts::default().task_execution(AGENT, "Write it up");
        assert!(result.system.contains("I MUST use these formats"));
        assert!(!result.system.contains("Action Input"));
    }

    #[test]
    fn test_tool_not_found() {
        let prompts = Prompts::new("", vec!["search".into(), "scrape".into()]);
        assert_eq!(
            prompts.tool_not_found("browse"),
            "Action 'browse' don't exist, these are the only available Actions:\nsearch, scrape"
        );
        assert!(Prompts::default().tool_not_found("x").contains("no tools available"));
    }

    #[test]
    fn test_task_with_context() {
        assert_eq!(task_with_context("Do it", "   "), "Do it");
        assert_eq!(
            task_with_context("Do it", "earlier"),
            "Do it\n\nThis is the context you're working with:\nearlier"
        );
    }

    #[test]
    fn test_braces_in_task_text_survive() {
        assert_eq!(
            task_with_context("Explain the {context} keyword", "PRIOR OUTPUT"),
            "Explain the {context} keyword\n\nThis is the context you're working with:\nPRIOR OUTPUT"
        );

        let agent = AgentInfo {
            role: "Writer",
            goal: "Document {input}",
            backstory: "Uses {goal} literally.",
        };
        let result = Prompts::default().task_execution(agent, "Document the {context} template");
        assert!(result.system.contains("Your personal goal is: Document {input}"));
        assert!(result.system.contains("Uses {goal} literally."));
        assert!(result.user.starts_with("Current Task: Document the {context} template"));
    }
}
