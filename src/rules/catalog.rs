//! Built-in technology rule dictionary.
//!
//! Trigger substrings are matched against the normalized (lowercased,
//! whitespace-collapsed) prompt, so they are written in lowercase.

use super::TechRule;

/// The default rule set compiled into the service.
pub fn builtin_rules() -> Vec<TechRule> {
    vec![
        TechRule {
            name: "react",
            triggers: &["react"],
            guidance: "Use Vite with the react template, functional components with hooks, \
                       and src/components + src/pages structure. Include an index.html entry \
                       and a vite.config.js.",
        },
        TechRule {
            name: "nextjs",
            triggers: &["next.js", "nextjs", "next js"],
            guidance: "Use the App Router (app/ directory) with layout.tsx and page.tsx, \
                       server components by default, and a next.config.mjs.",
        },
        TechRule {
            name: "vue",
            triggers: &["vue"],
            guidance: "Use Vue 3 single-file components with <script setup>, Vite tooling, \
                       and Pinia for state when state management is needed.",
        },
        TechRule {
            name: "svelte",
            triggers: &["svelte"],
            guidance: "Use SvelteKit with src/routes file-based routing and +page.svelte \
                       conventions.",
        },
        TechRule {
            name: "typescript",
            triggers: &["typescript", " ts "],
            guidance: "Emit .ts/.tsx sources with a strict tsconfig.json (strict: true, \
                       noUncheckedIndexedAccess: true) and typed module boundaries.",
        },
        TechRule {
            name: "tailwind",
            triggers: &["tailwind"],
            guidance: "Include tailwind.config.js and postcss.config.js, wire the three \
                       @tailwind directives into the main stylesheet, and use utility \
                       classes instead of custom CSS.",
        },
        TechRule {
            name: "express",
            triggers: &["express"],
            guidance: "Structure as src/app.js (app wiring), src/routes/, src/middleware/; \
                       separate app creation from server listen for testability; include \
                       error-handling middleware.",
        },
        TechRule {
            name: "fastify",
            triggers: &["fastify"],
            guidance: "Register routes as plugins, use JSON schema validation on every \
                       route, and export the app factory separately from the listener.",
        },
        TechRule {
            name: "django",
            triggers: &["django"],
            guidance: "Lay out a project package plus one app, include manage.py, \
                       settings.py split with environment variables via os.environ, and a \
                       requirements.txt.",
        },
        TechRule {
            name: "flask",
            triggers: &["flask"],
            guidance: "Use the application-factory pattern with blueprints, a config.py \
                       class hierarchy, and a wsgi.py entrypoint.",
        },
        TechRule {
            name: "rails",
            triggers: &["rails", "ruby on rails"],
            guidance: "Follow standard Rails conventions: config/routes.rb, app/models, \
                       app/controllers, a Gemfile, and database.yml reading from \
                       DATABASE_URL.",
        },
        TechRule {
            name: "spring",
            triggers: &["spring boot", "spring"],
            guidance: "Use Spring Boot with a Maven pom.xml, a single @SpringBootApplication \
                       class, constructor injection, and application.yml configuration.",
        },
        TechRule {
            name: "axum",
            triggers: &["axum", "rust api", "rust web"],
            guidance: "Use axum with tokio, a Router split into route modules, typed \
                       extractors, and thiserror-based error types implementing \
                       IntoResponse.",
        },
        TechRule {
            name: "postgresql",
            triggers: &["postgres", "postgresql"],
            guidance: "Read the connection string from DATABASE_URL, ship a migrations/ \
                       directory with numbered SQL files, and include a docker-compose \
                       service for local development.",
        },
        TechRule {
            name: "mysql",
            triggers: &["mysql", "mariadb"],
            guidance: "Read the connection string from DATABASE_URL and include a \
                       docker-compose service plus an initial schema migration.",
        },
        TechRule {
            name: "mongodb",
            triggers: &["mongo", "mongodb"],
            guidance: "Read MONGODB_URI from the environment, define schema-validated \
                       collections or ODM models, and include a docker-compose service.",
        },
        TechRule {
            name: "redis",
            triggers: &["redis"],
            guidance: "Read REDIS_URL from the environment and isolate cache access behind \
                       a single module so the cache can be disabled locally.",
        },
        TechRule {
            name: "prisma",
            triggers: &["prisma"],
            guidance: "Include prisma/schema.prisma with a datasource reading DATABASE_URL, \
                       a seed script, and generated-client usage behind a db module.",
        },
        TechRule {
            name: "docker",
            triggers: &["docker", "container"],
            guidance: "Provide a multi-stage Dockerfile building a minimal runtime image \
                       and a .dockerignore covering dependency and build directories.",
        },
        TechRule {
            name: "graphql",
            triggers: &["graphql"],
            guidance: "Define the schema in SDL, colocate resolvers per type, and expose a \
                       single /graphql endpoint with an example query in the README.",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_are_normalized_lowercase() {
        for rule in builtin_rules() {
            for trigger in rule.triggers {
                assert_eq!(
                    *trigger,
                    trigger.to_lowercase(),
                    "trigger for rule {} must be lowercase",
                    rule.name
                );
            }
        }
    }

    #[test]
    fn test_rule_names_are_unique() {
        let rules = builtin_rules();
        let mut names: Vec<_> = rules.iter().map(|rule| rule.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }
}
